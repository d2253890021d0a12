/// Store 模块 - 日志数据库的读写接口
///
/// 支持的后端:
/// - PostgreSQL (`postgres` 特性)
/// - SQLite (`sqlite` 特性，嵌入式部署与测试)
use crate::config::{Backend, DatabaseConfig};
use crate::constants::{APPLICATIONS_TABLE, IDENTIFIERS_TABLE, LOOKUP_SAVEPOINT};
use crate::error::Result;
use crate::level::Level;
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use self::postgres::PgStore;
#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteStore;

/// 连接句柄：同一连接只在一个线程内使用
pub type SharedStore<S> = Rc<RefCell<S>>;

/// 包装为共享句柄
pub fn shared<S: LogStore>(store: S) -> SharedStore<S> {
    Rc::new(RefCell::new(store))
}

/// 三表连接查询，最新的事件在前
pub(crate) const SELECT_EVENT_LINES_SQL: &str = "SELECT \
       log_applications.name, \
       log_identifiers.identifier, \
       log_events.level, \
       log_events.message, \
       log_events.created_at \
     FROM log_events \
     INNER JOIN log_applications ON log_applications.id = log_events.application_id \
     INNER JOIN log_identifiers ON log_identifiers.id = log_events.identifier_id \
     ORDER BY log_events.created_at DESC, log_events.id DESC";

/// 查找表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// `log_applications(name)`
    Application,
    /// `log_identifiers(identifier)`
    Identifier,
}

impl Lookup {
    pub const fn table(self) -> &'static str {
        match self {
            Lookup::Application => APPLICATIONS_TABLE,
            Lookup::Identifier => IDENTIFIERS_TABLE,
        }
    }

    pub const fn key_column(self) -> &'static str {
        match self {
            Lookup::Application => "name",
            Lookup::Identifier => "identifier",
        }
    }
}

/// 待写入的事件行
#[derive(Debug, Clone, Copy)]
pub struct NewEvent<'a> {
    pub level: Level,
    pub application_id: i32,
    pub identifier_id: i32,
    pub message: &'a str,
}

/// 连接查询还原出的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLine {
    pub created_at: NaiveDateTime,
    pub level: Level,
    pub application: String,
    pub identifier: String,
    pub message: String,
}

/// 日志存储 trait - 每个后端实现一次
///
/// Transactions follow the DB-API model: unless the store is in autocommit
/// mode, the first write opens a transaction that stays open until
/// [`commit`](LogStore::commit) or [`rollback`](LogStore::rollback).
pub trait LogStore {
    /// 后端名称 (用于日志记录)
    fn backend(&self) -> &'static str;

    /// 是否每条语句自动提交
    fn is_autocommit(&self) -> bool;

    /// 是否有打开的事务
    fn in_transaction(&self) -> bool;

    /// 准备写事件所需的语句，同时校验连接与表结构
    fn open_cursor(&mut self) -> Result<()>;

    /// `INSERT ... RETURNING id`；键已存在时返回 `DatabaseError::UniqueViolation`
    fn insert_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32>;

    /// 按键查询已存在的 id
    fn select_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32>;

    /// 在当前事务中建立保存点（必要时先开启事务）
    fn savepoint(&mut self, name: &str) -> Result<()>;

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()>;

    fn release_savepoint(&mut self, name: &str) -> Result<()>;

    /// 提交当前事务；没有打开的事务时什么也不做
    fn commit(&mut self) -> Result<()>;

    /// 回滚当前事务；没有打开的事务时什么也不做
    fn rollback(&mut self) -> Result<()>;

    /// 追加一行事件，不提交
    fn insert_event(&mut self, event: &NewEvent<'_>) -> Result<()>;

    /// 逐行读取连接查询结果，按 `created_at` 降序
    fn for_each_event_line(
        &mut self,
        visit: &mut dyn FnMut(EventLine) -> Result<()>,
    ) -> Result<()>;

    /// 幂等插入：插入失败于唯一约束时回退到保存点再按键查询
    ///
    /// Only a unique violation takes the fallback path. On any other failure
    /// the savepoint is rolled back and released, and a transaction opened by
    /// this call is rolled back, before the error is returned.
    fn get_or_create(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
        let opened = !self.in_transaction();
        if let Err(e) = self.savepoint(LOOKUP_SAVEPOINT) {
            if opened {
                let _ = self.rollback();
            }
            return Err(e);
        }

        let result = match self.insert_lookup(lookup, key) {
            Err(e) if e.is_unique_violation() => self
                .rollback_to_savepoint(LOOKUP_SAVEPOINT)
                .and_then(|()| self.select_lookup(lookup, key)),
            other => other,
        };

        match result {
            Ok(id) => {
                self.release_savepoint(LOOKUP_SAVEPOINT)?;
                Ok(id)
            }
            Err(e) => {
                // 清理失败时仍返回原始错误
                let _ = self
                    .rollback_to_savepoint(LOOKUP_SAVEPOINT)
                    .and_then(|()| self.release_savepoint(LOOKUP_SAVEPOINT));
                if opened {
                    let _ = self.rollback();
                }
                Err(e)
            }
        }
    }
}

/// 按配置打开存储
pub fn connect(config: &DatabaseConfig) -> Result<SharedStore<dyn LogStore>> {
    match config.backend {
        Backend::Postgres => {
            #[cfg(feature = "postgres")]
            {
                let store: SharedStore<dyn LogStore> = shared(PgStore::connect(config)?);
                Ok(store)
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(not_compiled_in(config.backend))
            }
        }
        Backend::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                let store: SharedStore<dyn LogStore> = shared(SqliteStore::connect(config)?);
                Ok(store)
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(not_compiled_in(config.backend))
            }
        }
    }
}

#[cfg(any(not(feature = "postgres"), not(feature = "sqlite")))]
fn not_compiled_in(backend: Backend) -> crate::error::Error {
    crate::config_error!(InvalidValue {
        field: "database.backend".to_string(),
        value: backend.as_str().to_string(),
        reason: "backend support was not compiled into this build".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, Error};

    /// insert_lookup 的预设结果
    #[derive(Debug, Clone, Copy)]
    enum InsertOutcome {
        Created(i32),
        Duplicate,
        Broken,
    }

    /// 记录调用顺序的存储，savepoint 与真实后端一样会先开启事务
    #[derive(Debug)]
    struct RecordingStore {
        outcome: InsertOutcome,
        existing_id: i32,
        in_transaction: bool,
        calls: Vec<String>,
    }

    impl RecordingStore {
        fn new(outcome: InsertOutcome) -> Self {
            Self {
                outcome,
                existing_id: 7,
                in_transaction: false,
                calls: Vec::new(),
            }
        }

        fn record(&mut self, call: &str) -> Result<()> {
            self.calls.push(call.to_string());
            Ok(())
        }
    }

    impl LogStore for RecordingStore {
        fn backend(&self) -> &'static str {
            "recording"
        }

        fn is_autocommit(&self) -> bool {
            true
        }

        fn in_transaction(&self) -> bool {
            self.in_transaction
        }

        fn open_cursor(&mut self) -> Result<()> {
            self.record("open_cursor")
        }

        fn insert_lookup(&mut self, lookup: Lookup, key: &str) -> Result<i32> {
            self.record("insert")?;
            match self.outcome {
                InsertOutcome::Created(id) => Ok(id),
                InsertOutcome::Duplicate => Err(Error::Database(DatabaseError::UniqueViolation {
                    table: lookup.table().to_string(),
                    key: key.to_string(),
                })),
                InsertOutcome::Broken => Err(Error::Database(DatabaseError::Query {
                    context: format!("Insert into {}", lookup.table()),
                    reason: "no such table".to_string(),
                })),
            }
        }

        fn select_lookup(&mut self, _lookup: Lookup, _key: &str) -> Result<i32> {
            self.record("select")?;
            Ok(self.existing_id)
        }

        fn savepoint(&mut self, _name: &str) -> Result<()> {
            if !self.in_transaction {
                self.record("begin")?;
                self.in_transaction = true;
            }
            self.record("savepoint")
        }

        fn rollback_to_savepoint(&mut self, _name: &str) -> Result<()> {
            self.record("rollback_to")
        }

        fn release_savepoint(&mut self, _name: &str) -> Result<()> {
            self.record("release")
        }

        fn commit(&mut self) -> Result<()> {
            self.in_transaction = false;
            self.record("commit")
        }

        fn rollback(&mut self) -> Result<()> {
            self.in_transaction = false;
            self.record("rollback")
        }

        fn insert_event(&mut self, _event: &NewEvent<'_>) -> Result<()> {
            self.record("insert_event")
        }

        fn for_each_event_line(
            &mut self,
            _visit: &mut dyn FnMut(EventLine) -> Result<()>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_get_or_create_inserts() {
        let mut store = RecordingStore::new(InsertOutcome::Created(3));
        let id = store.get_or_create(Lookup::Application, "app").unwrap();

        assert_eq!(id, 3);
        assert_eq!(store.calls, ["begin", "savepoint", "insert", "release"]);
        // 事务留给调用方提交
        assert!(store.in_transaction());
    }

    #[test]
    fn test_get_or_create_falls_back_on_duplicate() {
        let mut store = RecordingStore::new(InsertOutcome::Duplicate);
        let id = store.get_or_create(Lookup::Identifier, "main.rs").unwrap();

        assert_eq!(id, 7);
        assert_eq!(
            store.calls,
            ["begin", "savepoint", "insert", "rollback_to", "select", "release"]
        );
    }

    #[test]
    fn test_get_or_create_failure_rolls_back_own_transaction() {
        let mut store = RecordingStore::new(InsertOutcome::Broken);
        let err = store.get_or_create(Lookup::Identifier, "main.rs").unwrap_err();

        assert!(!err.is_unique_violation());
        assert_eq!(
            store.calls,
            ["begin", "savepoint", "insert", "rollback_to", "release", "rollback"]
        );
        assert!(!store.in_transaction());
    }

    #[test]
    fn test_get_or_create_failure_keeps_caller_transaction() {
        let mut store = RecordingStore::new(InsertOutcome::Broken);
        store.in_transaction = true;

        assert!(store.get_or_create(Lookup::Application, "app").is_err());
        assert_eq!(store.calls, ["savepoint", "insert", "rollback_to", "release"]);
        assert!(store.in_transaction());
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(Lookup::Application.table(), "log_applications");
        assert_eq!(Lookup::Application.key_column(), "name");
        assert_eq!(Lookup::Identifier.table(), "log_identifiers");
        assert_eq!(Lookup::Identifier.key_column(), "identifier");
    }

    #[test]
    fn test_select_orders_newest_first() {
        assert!(SELECT_EVENT_LINES_SQL.contains("INNER JOIN log_applications"));
        assert!(SELECT_EVENT_LINES_SQL.contains("INNER JOIN log_identifiers"));
        assert!(SELECT_EVENT_LINES_SQL.ends_with("ORDER BY log_events.created_at DESC, log_events.id DESC"));
    }
}
