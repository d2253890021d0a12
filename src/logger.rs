//! 写入数据库的日志记录器
//!
//! A [`Logger`] is bound to one application name and one identifier (usually
//! the module or file emitting the events). [`Logger::prepare`] resolves both
//! strings to ids in the lookup tables once; every event after that is a single
//! narrow insert into `log_events`.
//!
//! ```no_run
//! use dblog::{Level, LogStore, Logger, SqliteStore, shared};
//!
//! # fn main() -> dblog::Result<()> {
//! let store = shared(SqliteStore::open("dblog.db")?);
//! let mut logger = Logger::new("loansbot", "scanner.rs", store.clone()).with_min_level(Level::Info);
//! logger.prepare()?;
//! logger.print_fmt(Level::Warn, "queue depth {} over limit", &[&128])?;
//! dblog::db_log!(logger, Level::Info, "processed {} comments", 42)?;
//! store.borrow_mut().commit()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, LoggerError, Result};
use crate::format::format_template;
use crate::level::Level;
use crate::store::{LogStore, Lookup, NewEvent, SharedStore};
use log::debug;
use std::borrow::Cow;
use std::fmt::{self, Display};
use std::rc::Rc;

/// 已解析的查找表 id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    app_id: i32,
    iden_id: i32,
}

/// Leveled logger writing events through a shared [`LogStore`].
pub struct Logger<S: LogStore + ?Sized> {
    appname: String,
    identifier: String,
    store: SharedStore<S>,
    min_level: Level,
    cursor: Option<Cursor>,
}

impl<S: LogStore + ?Sized> fmt::Debug for Logger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("appname", &self.appname)
            .field("identifier", &self.identifier)
            .field("min_level", &self.min_level)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<S: LogStore + ?Sized> Logger<S> {
    /// 创建记录器，阈值默认为 TRACE；需调用 [`prepare`](Self::prepare) 后才能写入
    pub fn new(
        appname: impl Into<String>,
        identifier: impl Into<String>,
        store: SharedStore<S>,
    ) -> Self {
        Self {
            appname: appname.into(),
            identifier: identifier.into(),
            store,
            min_level: Level::Trace,
            cursor: None,
        }
    }

    /// 设置最低写入级别
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn appname(&self) -> &str {
        &self.appname
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// `log_applications.id`，prepare 之前为 None
    pub fn app_id(&self) -> Option<i32> {
        self.cursor.map(|c| c.app_id)
    }

    /// `log_identifiers.id`，prepare 之前为 None
    pub fn iden_id(&self) -> Option<i32> {
        self.cursor.map(|c| c.iden_id)
    }

    pub fn is_prepared(&self) -> bool {
        self.cursor.is_some()
    }

    /// 共享的存储句柄，调用方通过它提交事务
    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    /// 是否会写入该级别的事件
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Resolves the application and identifier ids. No-op once prepared.
    ///
    /// Each lookup is a get-or-create followed by a commit, so this also
    /// commits anything the caller left pending on the connection. Loggers on
    /// separate connections may race here; the unique constraints decide the
    /// winner and everyone else reads the winner's id.
    pub fn prepare(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }

        let mut store = self.store.borrow_mut();
        store.open_cursor()?;
        let app_id = store.get_or_create(Lookup::Application, &self.appname)?;
        store.commit()?;
        let iden_id = store.get_or_create(Lookup::Identifier, &self.identifier)?;
        store.commit()?;
        drop(store);

        debug!(
            "Logger prepared: {} (id {}) / {} (id {})",
            self.appname, app_id, self.identifier, iden_id
        );
        self.cursor = Some(Cursor { app_id, iden_id });
        Ok(())
    }

    /// 写入一条消息（原样存储）；低于阈值时什么也不做，不提交
    pub fn print(&self, level: Level, message: &str) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        self.raw_insert(level, message)
    }

    /// 按位置把参数代入模板后写入；没有参数时模板原样写入
    pub fn print_fmt(&self, level: Level, template: &str, args: &[&dyn Display]) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let message = render(template, args)?;
        self.raw_insert(level, &message)
    }

    /// 编译期检查的格式化版本，参数只在通过阈值时才渲染
    pub fn print_args(&self, level: Level, args: fmt::Arguments<'_>) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let message = match args.as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(args.to_string()),
        };
        self.raw_insert(level, &message)
    }

    /// Writes the report of `error`: its message, `Caused by:` chain and
    /// backtrace (when captured).
    pub fn exception(&self, level: Level, error: &anyhow::Error) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        self.raw_insert(level, &format!("{error:?}"))
    }

    /// Like [`exception`](Self::exception) with a formatted prefix line
    /// before the report.
    pub fn exception_fmt(
        &self,
        level: Level,
        error: &anyhow::Error,
        template: &str,
        args: &[&dyn Display],
    ) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }
        let prefix = render(template, args)?;
        self.raw_insert(level, &format!("{prefix}\n{error:?}"))
    }

    /// Derives a logger labelled `identifier` without a database round trip.
    ///
    /// The derived logger copies this logger's resolved ids verbatim, so its
    /// events are stored under the source logger's identifier id; only
    /// [`identifier`](Self::identifier) reports the new label. Use
    /// [`with_identifier_resolved`](Self::with_identifier_resolved) when the
    /// rows must be attributed to the new identifier.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        Self {
            appname: self.appname.clone(),
            identifier: identifier.into(),
            store: Rc::clone(&self.store),
            min_level: self.min_level,
            cursor: self.cursor,
        }
    }

    /// Derives a logger for `identifier` and resolves that identifier's own id.
    ///
    /// Reuses the application id when this logger is prepared (one
    /// get-or-create and commit); otherwise prepares the derived logger
    /// from scratch.
    pub fn with_identifier_resolved(&self, identifier: impl Into<String>) -> Result<Self> {
        let mut derived = self.with_identifier(identifier);
        let Some(cursor) = self.cursor else {
            derived.prepare()?;
            return Ok(derived);
        };

        let mut store = self.store.borrow_mut();
        store.open_cursor()?;
        let iden_id = store.get_or_create(Lookup::Identifier, &derived.identifier)?;
        store.commit()?;
        drop(store);

        debug!(
            "Derived logger resolved: {} (id {})",
            derived.identifier, iden_id
        );
        derived.cursor = Some(Cursor {
            app_id: cursor.app_id,
            iden_id,
        });
        Ok(derived)
    }

    /// 释放本地状态；不会关闭连接。可重复调用
    ///
    /// Drops this logger's resolved ids. The prepared event insert opened by
    /// [`prepare`](Self::prepare) belongs to the connection and is shared by
    /// every logger on it, so it stays until the store itself is dropped.
    pub fn close(&mut self) {
        if self.cursor.take().is_some() {
            debug!("Logger closed: {}/{}", self.appname, self.identifier);
        }
    }

    fn raw_insert(&self, level: Level, message: &str) -> Result<()> {
        let cursor = self.cursor.ok_or_else(|| {
            Error::Logger(LoggerError::NotPrepared {
                appname: self.appname.clone(),
                identifier: self.identifier.clone(),
            })
        })?;
        self.store.borrow_mut().insert_event(&NewEvent {
            level,
            application_id: cursor.app_id,
            identifier_id: cursor.iden_id,
            message,
        })
    }
}

fn render<'a>(template: &'a str, args: &[&dyn Display]) -> Result<Cow<'a, str>> {
    if args.is_empty() {
        Ok(Cow::Borrowed(template))
    } else {
        Ok(Cow::Owned(format_template(template, args)?))
    }
}

/// 以 `format_args!` 语法写入一条事件
///
/// ```ignore
/// db_log!(logger, Level::Info, "processed {} comments", count)?;
/// ```
#[macro_export]
macro_rules! db_log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.print_args($level, ::std::format_args!($($arg)+))
    };
}
