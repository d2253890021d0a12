use crate::config::LoggingConfig;
use crate::error::{Error, FileError, Result};
use crate::level::Level;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 初始化诊断日志（stderr + 文件）
///
/// Standard output is left to query output.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;

    let log_path = Path::new(&config.file);
    if let Some(parent_dir) = log_path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent_dir.exists()
    {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::File(FileError::CreateDirectoryFailed {
                path: parent_dir.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    // 追加写入，不做滚动
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| {
            Error::File(FileError::WriteFailed {
                path: log_path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

    struct SimpleLogger {
        level: LevelFilter,
        file: Arc<Mutex<std::fs::File>>,
    }

    impl log::Log for SimpleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= self.level
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }

            let msg = format!(
                "{} [{}] {} - {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );

            let _ = std::io::stderr().write_all(msg.as_bytes());

            if let Ok(mut f) = self.file.lock() {
                let _ = f.write_all(msg.as_bytes());
            }
        }

        fn flush(&self) {
            if let Ok(mut f) = self.file.lock() {
                let _ = f.flush();
            }
        }
    }

    let logger = SimpleLogger {
        level,
        file: Arc::new(Mutex::new(file)),
    };

    log::set_max_level(level);
    log::set_boxed_logger(Box::new(logger)).map_err(|e: SetLoggerError| {
        Error::File(FileError::WriteFailed {
            path: log_path.to_path_buf(),
            reason: format!("Failed to install logger: {e}"),
        })
    })?;

    log::debug!(
        "Logging initialized - level: {:?}, file: {}",
        level,
        config.file
    );

    Ok(())
}

/// 控制台日志（init/schema/completions 等不需要配置文件的命令）
pub fn init_console_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(filter)
        .try_init();
}

/// 解析日志级别字符串
fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    level_str.parse::<Level>().map(Level::to_level_filter)
}
