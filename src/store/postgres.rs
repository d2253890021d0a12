use super::{EventLine, LogStore, Lookup, NewEvent, SELECT_EVENT_LINES_SQL};
use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, Error, Result};
use crate::level::Level;
use ::postgres::error::SqlState;
use ::postgres::fallible_iterator::FallibleIterator;
use ::postgres::types::ToSql;
use ::postgres::{Client, NoTls, Statement};
use chrono::NaiveDateTime;
use log::{debug, info};
use std::fmt;

const INSERT_EVENT_SQL: &str = "INSERT INTO log_events \
     (level, application_id, identifier_id, message) VALUES ($1, $2, $3, $4)";

fn insert_lookup_sql(lookup: Lookup) -> &'static str {
    match lookup {
        Lookup::Application => "INSERT INTO log_applications (name) VALUES ($1) RETURNING id",
        Lookup::Identifier => {
            "INSERT INTO log_identifiers (\"identifier\") VALUES ($1) RETURNING id"
        }
    }
}

fn select_lookup_sql(lookup: Lookup) -> &'static str {
    match lookup {
        Lookup::Application => "SELECT id FROM log_applications WHERE name = $1",
        Lookup::Identifier => "SELECT id FROM log_identifiers WHERE \"identifier\" = $1",
    }
}

/// PostgreSQL 存储 - 同步 `postgres::Client`
pub struct PgStore {
    client: Client,
    autocommit: bool,
    in_transaction: bool,
    insert_event: Option<Statement>,
}

impl fmt::Debug for PgStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgStore")
            .field("autocommit", &self.autocommit)
            .field("in_transaction", &self.in_transaction)
            .field("cursor_open", &self.insert_event.is_some())
            .finish_non_exhaustive()
    }
}

impl PgStore {
    /// 使用配置建立连接
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            "Connecting to PostgreSQL at {}:{}/{}",
            config.host, config.port, config.database
        );
        let client = Client::connect(&config.connection_string(), NoTls).map_err(|e| {
            Error::Database(DatabaseError::Connect {
                backend: "PostgreSQL".to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(Self::from_client(client).with_autocommit(config.autocommit))
    }

    /// 包装调用方已建立的连接（默认手动提交）
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            autocommit: false,
            in_transaction: false,
            insert_event: None,
        }
    }

    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// 底层连接（不要在这里提交/回滚，使用 `LogStore::commit`）
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.client
                .batch_execute("BEGIN")
                .map_err(|e| query_error("BEGIN", &e))?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn execute_control(&mut self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .map_err(|e| query_error(sql, &e))
    }
}

impl LogStore for PgStore {
    fn backend(&self) -> &'static str {
        "PostgreSQL"
    }

    fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn open_cursor(&mut self) -> Result<()> {
        if self.insert_event.is_none() {
            let statement = self
                .client
                .prepare(INSERT_EVENT_SQL)
                .map_err(|e| query_error("Prepare event insert", &e))?;
            debug!("Prepared PostgreSQL event insert statement");
            self.insert_event = Some(statement);
        }
        Ok(())
    }

    fn insert_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
        let row = self
            .client
            .query_one(insert_lookup_sql(lookup), &[&key])
            .map_err(|e| insert_lookup_error(lookup, key, e.code(), &e))?;
        row.try_get(0)
            .map_err(|e| query_error(&format!("Read id from {}", lookup.table()), &e))
    }

    fn select_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
        let row = self
            .client
            .query_one(select_lookup_sql(lookup), &[&key])
            .map_err(|e| query_error(&format!("Select from {}", lookup.table()), &e))?;
        row.try_get(0)
            .map_err(|e| query_error(&format!("Read id from {}", lookup.table()), &e))
    }

    fn savepoint(&mut self, name: &str) -> Result<()> {
        // 保存点只能存在于事务块中，自动提交模式也要先开启事务
        self.begin()?;
        self.execute_control(&format!("SAVEPOINT {name}"))
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        self.execute_control(&format!("ROLLBACK TO SAVEPOINT {name}"))
    }

    fn release_savepoint(&mut self, name: &str) -> Result<()> {
        self.execute_control(&format!("RELEASE SAVEPOINT {name}"))
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.execute_control("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.execute_control("ROLLBACK")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn insert_event(&mut self, event: &NewEvent<'_>) -> Result<()> {
        if !self.autocommit {
            self.begin()?;
        }
        let level = event.level.code();
        let params: [&(dyn ToSql + Sync); 4] = [
            &level,
            &event.application_id,
            &event.identifier_id,
            &event.message,
        ];
        let result = match self.insert_event.clone() {
            Some(statement) => self.client.execute(&statement, &params),
            None => self.client.execute(INSERT_EVENT_SQL, &params),
        };
        result.map_err(|e| query_error("Insert into log_events", &e))?;
        Ok(())
    }

    fn for_each_event_line(
        &mut self,
        visit: &mut dyn FnMut(EventLine) -> Result<()>,
    ) -> Result<()> {
        let mut rows = self
            .client
            .query_raw(SELECT_EVENT_LINES_SQL, std::iter::empty::<&dyn ToSql>())
            .map_err(|e| query_error("Select log events", &e))?;

        while let Some(row) = rows.next().map_err(|e| query_error("Fetch log event", &e))? {
            let read = |e: ::postgres::Error| query_error("Read log event", &e);
            let application: String = row.try_get(0).map_err(read)?;
            let identifier: String = row.try_get(1).map_err(read)?;
            let code: i32 = row.try_get(2).map_err(read)?;
            let message: String = row.try_get(3).map_err(read)?;
            let created_at: NaiveDateTime = row.try_get(4).map_err(read)?;

            visit(EventLine {
                created_at,
                level: Level::try_from(code)?,
                application,
                identifier,
                message,
            })?;
        }
        Ok(())
    }
}

/// SQLSTATE 23505 映射为 `UniqueViolation`，其余为普通查询错误
fn insert_lookup_error(
    lookup: Lookup,
    key: &str,
    code: Option<&SqlState>,
    reason: &dyn fmt::Display,
) -> Error {
    if code == Some(&SqlState::UNIQUE_VIOLATION) {
        Error::Database(DatabaseError::UniqueViolation {
            table: lookup.table().to_string(),
            key: key.to_string(),
        })
    } else {
        Error::Database(DatabaseError::Query {
            context: format!("Insert into {}", lookup.table()),
            reason: reason.to_string(),
        })
    }
}

fn query_error(context: &str, e: &::postgres::Error) -> Error {
    Error::Database(DatabaseError::Query {
        context: context.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_takes_fallback() {
        let err = insert_lookup_error(
            Lookup::Application,
            "loansbot",
            Some(&SqlState::UNIQUE_VIOLATION),
            &"duplicate key value violates unique constraint",
        );
        assert!(err.is_unique_violation());
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation { ref table, ref key })
                if table == "log_applications" && key == "loansbot"
        ));
    }

    #[test]
    fn test_other_sqlstates_are_query_errors() {
        for code in [
            Some(&SqlState::UNDEFINED_TABLE),
            Some(&SqlState::INSUFFICIENT_PRIVILEGE),
            Some(&SqlState::NOT_NULL_VIOLATION),
            None,
        ] {
            let err = insert_lookup_error(Lookup::Identifier, "main.rs", code, &"boom");
            assert!(!err.is_unique_violation(), "{code:?} treated as duplicate");
            assert_eq!(
                err.to_string(),
                "Database error: Insert into log_identifiers failed: boom"
            );
        }
    }
}
