use crate::constants::LOG_LEVELS;
use crate::error::{ConfigError, Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// PostgreSQL 默认主机
fn default_postgres_host() -> String {
    "localhost".to_string()
}

/// PostgreSQL 默认端口
fn default_postgres_port() -> u16 {
    5432
}

/// PostgreSQL 默认用户名
fn default_postgres_username() -> String {
    "postgres".to_string()
}

/// PostgreSQL 默认数据库
fn default_postgres_database() -> String {
    "postgres".to_string()
}

/// SQLite 默认数据库文件
fn default_sqlite_path() -> String {
    "dblog.db".to_string()
}

fn default_log_file() -> String {
    "logs/dblog.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::Config(ConfigError::NotFound(path.to_path_buf())))?;
        Self::from_str(&content, path.to_path_buf())
    }

    /// 从字符串解析配置
    pub fn from_str(content: &str, path: PathBuf) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            Error::Config(ConfigError::ParseFailed {
                path,
                reason: e.to_string(),
            })
        })?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.database.validate()?;
        Ok(())
    }
}

/// 存储后端
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
        }
    }
}

/// 数据库连接配置
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// 存储后端
    #[serde(default)]
    pub backend: Backend,
    /// PostgreSQL 主机地址
    #[serde(default = "default_postgres_host")]
    pub host: String,
    /// PostgreSQL 端口
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    /// 用户名
    #[serde(default = "default_postgres_username")]
    pub username: String,
    /// 密码
    #[serde(default)]
    pub password: String,
    /// 数据库名
    #[serde(default = "default_postgres_database")]
    pub database: String,
    /// SQLite 数据库文件路径
    #[serde(default = "default_sqlite_path")]
    pub path: String,
    /// 是否每条语句自动提交
    #[serde(default)]
    pub autocommit: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Postgres,
            host: default_postgres_host(),
            port: default_postgres_port(),
            username: default_postgres_username(),
            password: String::new(),
            database: default_postgres_database(),
            path: default_sqlite_path(),
            autocommit: false,
        }
    }
}

impl DatabaseConfig {
    /// 获取 libpq 风格的连接字符串
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_conn_value(&self.host)),
            format!("port={}", self.port),
            format!("user={}", quote_conn_value(&self.username)),
        ];
        if !self.password.is_empty() {
            parts.push(format!("password={}", quote_conn_value(&self.password)));
        }
        parts.push(format!("dbname={}", quote_conn_value(&self.database)));
        parts.join(" ")
    }

    /// 用 libpq 标准环境变量覆盖配置
    ///
    /// Takes the variables explicitly so library code never reads the process
    /// environment; `main` passes `std::env::vars()`.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                "PGHOST" => self.host = value.into(),
                "PGPORT" => {
                    let value = value.into();
                    self.port = value.trim().parse().map_err(|_| {
                        Error::Config(ConfigError::InvalidValue {
                            field: "PGPORT".to_string(),
                            value: value.clone(),
                            reason: "Port must be an integer between 1 and 65535".to_string(),
                        })
                    })?;
                }
                "PGUSER" => self.username = value.into(),
                "PGPASSWORD" => self.password = value.into(),
                "PGDATABASE" => self.database = value.into(),
                _ => {}
            }
        }
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            Backend::Postgres => {
                if self.host.trim().is_empty() {
                    return Err(invalid("database.host", &self.host, "Host cannot be empty"));
                }
                if self.port == 0 {
                    return Err(invalid(
                        "database.port",
                        &self.port.to_string(),
                        "Port must be between 1 and 65535",
                    ));
                }
                if self.database.trim().is_empty() {
                    return Err(invalid(
                        "database.database",
                        &self.database,
                        "Database name cannot be empty",
                    ));
                }
            }
            Backend::Sqlite => {
                if self.path.trim().is_empty() {
                    return Err(invalid(
                        "database.path",
                        &self.path,
                        "SQLite database path cannot be empty",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> Error {
    Error::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

/// 按 libpq 规则给含空格或引号的值加单引号
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// 应用日志输出文件路径
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl LoggingConfig {
    /// 获取日志输出文件路径
    pub fn file(&self) -> &str {
        &self.file
    }

    /// 获取日志级别
    pub fn level(&self) -> &str {
        &self.level
    }

    /// 验证日志级别是否有效
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS
            .iter()
            .any(|&l| l.eq_ignore_ascii_case(self.level.as_str()))
        {
            return Err(Error::Config(ConfigError::InvalidLogLevel {
                level: self.level.clone(),
                valid_levels: LOG_LEVELS.iter().map(|s| (*s).to_string()).collect(),
            }));
        }

        if self.file.trim().is_empty() {
            return Err(invalid("logging.file", &self.file, "Log file path cannot be empty"));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_conn_value() {
        assert_eq!(quote_conn_value("localhost"), "localhost");
        assert_eq!(quote_conn_value(""), "''");
        assert_eq!(quote_conn_value("with space"), "'with space'");
        assert_eq!(quote_conn_value("it's"), "'it\\'s'");
        assert_eq!(quote_conn_value("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_connection_string_omits_empty_password() {
        let cfg = DatabaseConfig::default();
        assert_eq!(
            cfg.connection_string(),
            "host=localhost port=5432 user=postgres dbname=postgres"
        );
    }
}
