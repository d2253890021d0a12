//! 公共常量
//! 提供：
//! - 合法日志级别常量 LOG_LEVELS
//! - 表名与列名
//! - 默认配置值

/// 合法的日志级别（统一来源）
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// 应用查找表
pub const APPLICATIONS_TABLE: &str = "log_applications";

/// 标识符查找表
pub const IDENTIFIERS_TABLE: &str = "log_identifiers";

/// 事件表
pub const EVENTS_TABLE: &str = "log_events";

/// get-or-create 使用的保存点名称
pub const LOOKUP_SAVEPOINT: &str = "dblog_lookup";

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// SQLite 等待写锁的时间（毫秒）
pub const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;
