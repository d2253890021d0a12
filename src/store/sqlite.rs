use super::{EventLine, LogStore, Lookup, NewEvent, SELECT_EVENT_LINES_SQL};
use crate::config::DatabaseConfig;
use crate::constants::SQLITE_BUSY_TIMEOUT_MS;
use crate::error::{DatabaseError, Error, Result};
use crate::level::Level;
use chrono::NaiveDateTime;
use log::{debug, info};
use rusqlite::{Connection, ErrorCode, params};
use std::path::Path;
use std::time::Duration;

const INSERT_EVENT_SQL: &str = "INSERT INTO log_events \
     (level, application_id, identifier_id, message) VALUES (?1, ?2, ?3, ?4)";

fn insert_lookup_sql(lookup: Lookup) -> &'static str {
    match lookup {
        Lookup::Application => "INSERT INTO log_applications (name) VALUES (?1) RETURNING id",
        Lookup::Identifier => {
            "INSERT INTO log_identifiers (\"identifier\") VALUES (?1) RETURNING id"
        }
    }
}

fn select_lookup_sql(lookup: Lookup) -> &'static str {
    match lookup {
        Lookup::Application => "SELECT id FROM log_applications WHERE name = ?1",
        Lookup::Identifier => "SELECT id FROM log_identifiers WHERE \"identifier\" = ?1",
    }
}

/// SQLite 存储 - 嵌入式部署与测试使用
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    autocommit: bool,
    in_transaction: bool,
}

impl SqliteStore {
    /// 使用配置打开数据库文件
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::open(&config.path)?.with_autocommit(config.autocommit))
    }

    /// 打开数据库文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening SQLite database: {}", path.display());
        let conn = Connection::open(path).map_err(|e| connect_error(&e))?;
        Self::from_connection(conn)
    }

    /// 打开内存数据库（表结构需由调用方创建）
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| connect_error(&e))?;
        Self::from_connection(conn)
    }

    /// 包装调用方已打开的连接（默认手动提交）
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))
            .map_err(|e| query_error("Set busy timeout", &e))?;
        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| query_error("Enable foreign keys", &e))?;
        Ok(Self {
            conn,
            autocommit: false,
            in_transaction: false,
        })
    }

    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// 底层连接（不要在这里提交/回滚，使用 `LogStore::commit`）
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            // IMMEDIATE 直接取得写锁，并发写入者在 busy_timeout 内排队
            self.execute_control("BEGIN IMMEDIATE")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn execute_control(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| query_error(sql, &e))
    }
}

impl LogStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "SQLite"
    }

    fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn open_cursor(&mut self) -> Result<()> {
        self.conn
            .prepare_cached(INSERT_EVENT_SQL)
            .map_err(|e| query_error("Prepare event insert", &e))?;
        debug!("Prepared SQLite event insert statement");
        Ok(())
    }

    fn insert_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
        self.conn
            .query_row(insert_lookup_sql(lookup), params![key], |row| row.get(0))
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Database(DatabaseError::UniqueViolation {
                        table: lookup.table().to_string(),
                        key: key.to_string(),
                    })
                } else {
                    query_error(&format!("Insert into {}", lookup.table()), &e)
                }
            })
    }

    fn select_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
        self.conn
            .query_row(select_lookup_sql(lookup), params![key], |row| row.get(0))
            .map_err(|e| query_error(&format!("Select from {}", lookup.table()), &e))
    }

    fn savepoint(&mut self, name: &str) -> Result<()> {
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
        let mut statement = self
            .conn
            .prepare_cached(INSERT_EVENT_SQL)
            .map_err(|e| query_error("Prepare event insert", &e))?;
        statement
            .execute(params![
                event.level.code(),
                event.application_id,
                event.identifier_id,
                event.message
            ])
            .map_err(|e| query_error("Insert into log_events", &e))?;
        Ok(())
    }

    fn for_each_event_line(
        &mut self,
        visit: &mut dyn FnMut(EventLine) -> Result<()>,
    ) -> Result<()> {
        let mut statement = self
            .conn
            .prepare(SELECT_EVENT_LINES_SQL)
            .map_err(|e| query_error("Prepare log event select", &e))?;
        let mut rows = statement
            .query([])
            .map_err(|e| query_error("Select log events", &e))?;

        while let Some(row) = rows.next().map_err(|e| query_error("Fetch log event", &e))? {
            let read = |e: rusqlite::Error| query_error("Read log event", &e);
            let application: String = row.get(0).map_err(read)?;
            let identifier: String = row.get(1).map_err(read)?;
            let code: i64 = row.get(2).map_err(read)?;
            let message: String = row.get(3).map_err(read)?;
            let created_at: NaiveDateTime = row.get(4).map_err(read)?;

            visit(EventLine {
                created_at,
                level: Level::from_code(code)?,
                application,
                identifier,
                message,
            })?;
        }
        Ok(())
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn connect_error(e: &rusqlite::Error) -> Error {
    Error::Database(DatabaseError::Connect {
        backend: "SQLite".to_string(),
        reason: e.to_string(),
    })
}

fn query_error(context: &str, e: &rusqlite::Error) -> Error {
    Error::Database(DatabaseError::Query {
        context: context.to_string(),
        reason: e.to_string(),
    })
}
