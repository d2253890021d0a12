//! 日志级别
//!
//! 级别既是过滤阈值，也是 `log_events.level` 列中存储的整数编码。

use crate::constants::LOG_LEVELS;
use crate::error::{ConfigError, DatabaseError, Error};
use std::fmt;
use std::str::FromStr;

/// Severity of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Control-flow breadcrumbs rather than the actions themselves.
    #[default]
    Trace = 0,
    /// Variable values useful when chasing down a warning or error.
    Debug = 1,
    /// Outwardly visible events.
    Info = 2,
    /// Impaired execution or likely misconfiguration with a known recovery path.
    Warn = 3,
    /// Unexpected and possibly unrecoverable situations.
    Error = 4,
}

impl Level {
    /// 全部级别，按严重程度升序
    pub const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    /// 显示名称（大写）
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// 存储用的整数编码
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// 从存储编码还原级别
    pub fn from_code(code: i64) -> Result<Self, DatabaseError> {
        match code {
            0 => Ok(Level::Trace),
            1 => Ok(Level::Debug),
            2 => Ok(Level::Info),
            3 => Ok(Level::Warn),
            4 => Ok(Level::Error),
            _ => Err(DatabaseError::InvalidLevel { code }),
        }
    }

    /// 映射到 `log` crate 的级别过滤器
    pub const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Level::Trace => log::LevelFilter::Trace,
            Level::Debug => log::LevelFilter::Debug,
            Level::Info => log::LevelFilter::Info,
            Level::Warn => log::LevelFilter::Warn,
            Level::Error => log::LevelFilter::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for i32 {
    fn from(level: Level) -> Self {
        level.code()
    }
}

impl TryFrom<i32> for Level {
    type Error = DatabaseError;

    fn try_from(code: i32) -> Result<Self, DatabaseError> {
        Level::from_code(i64::from(code))
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(ConfigError::InvalidLogLevel {
                    level: s.to_string(),
                    valid_levels: LOG_LEVELS.iter().map(|s| (*s).to_string()).collect(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_codes_round_trip() {
        for (expected, level) in Level::ALL.into_iter().enumerate() {
            let code = i32::from(level);
            assert_eq!(code as usize, expected);
            assert_eq!(Level::try_from(code).unwrap(), level);
        }
    }

    #[test]
    fn test_invalid_code() {
        assert!(matches!(
            Level::from_code(5),
            Err(DatabaseError::InvalidLevel { code: 5 })
        ));
        assert!(Level::try_from(-1).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" ERROR ".parse::<Level>().unwrap(), Level::Error);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_default_is_trace() {
        assert_eq!(Level::default(), Level::Trace);
    }

    #[test]
    fn test_try_from_i32() {
        assert!(matches!(Level::try_from(3), Ok(Level::Warn)));
        assert!(matches!(Level::try_from(0), Ok(Level::Trace)));
        assert!(matches!(
            Level::try_from(-1),
            Err(DatabaseError::InvalidLevel { code: -1 })
        ));
        assert_eq!(i32::from(Level::Error), 4);
    }
}
