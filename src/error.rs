use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration related error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File operation error
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Message template error
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Logger state error
    #[error("Logger error: {0}")]
    Logger(#[from] LoggerError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// 是否为唯一约束冲突（get-or-create 的预期分支）
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::UniqueViolation { .. }))
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Configuration file parse failed
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// Invalid log level
    #[error("Invalid log level '{level}', valid values: {}", valid_levels.join(", "))]
    InvalidLogLevel {
        level: String,
        valid_levels: Vec<String>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value {field} = '{value}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// File already exists
    #[error("File already exists: {path} (use --force to replace)")]
    AlreadyExists { path: PathBuf },

    /// File write failed
    #[error("Failed to write file {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// Create directory failed
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirectoryFailed { path: PathBuf, reason: String },
}

/// 数据库错误
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not open a connection
    #[error("Failed to connect to {backend} database: {reason}")]
    Connect { backend: String, reason: String },

    /// A statement failed
    #[error("{context} failed: {reason}")]
    Query { context: String, reason: String },

    /// Insert hit a unique constraint
    #[error("Duplicate key '{key}' in {table}")]
    UniqueViolation { table: String, key: String },

    /// Stored level code is outside 0-4
    #[error("Invalid level code {code}, expected 0-4")]
    InvalidLevel { code: i64 },
}

/// 消息模板错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// `{` or `}` without a partner
    #[error("Unmatched '{brace}' at position {position} in message template")]
    UnmatchedBrace { brace: char, position: usize },

    /// Placeholder refers past the end of the arguments
    #[error("Placeholder {{{index}}} has no matching argument ({supplied} supplied)")]
    MissingArgument { index: usize, supplied: usize },

    /// Some arguments were never referenced
    #[error("{unused} of {supplied} format argument(s) not used by the message template")]
    UnusedArguments { unused: usize, supplied: usize },

    /// `{}` and `{0}` in the same template
    #[error("Cannot mix automatic '{{}}' and numbered '{{N}}' placeholders")]
    MixedNumbering,

    /// Anything other than an empty or numeric field
    #[error("Unsupported placeholder '{{{field}}}', only '{{}}' and '{{N}}' are allowed")]
    UnsupportedField { field: String },
}

/// Logger 状态错误
#[derive(Debug, Error)]
pub enum LoggerError {
    /// print/exception called before prepare()
    #[error("Logger {appname}/{identifier} used before prepare()")]
    NotPrepared { appname: String, identifier: String },
}

/// 应用程序 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

// 辅助宏，用于快速创建错误
#[macro_export]
macro_rules! config_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::Config($crate::error::ConfigError::$variant {
            $($field: $value),+
        })
    };
}

#[macro_export]
macro_rules! file_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::File($crate::error::FileError::$variant {
            $($field: $value),+
        })
    };
}

#[macro_export]
macro_rules! database_error {
    ($variant:ident { $($field:ident: $value:expr),+ $(,)? }) => {
        $crate::error::Error::Database($crate::error::DatabaseError::$variant {
            $($field: $value),+
        })
    };
}
