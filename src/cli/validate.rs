use log::info;

use dblog::config::{Backend, Config};
use dblog::error::Result;

/// 验证配置文件
pub fn handle_validate(cfg: &Config) -> Result<()> {
    info!("Configuration validated in main");

    info!("Backend: {}", cfg.database.backend.as_str());
    match cfg.database.backend {
        Backend::Postgres => {
            info!(
                "PostgreSQL: {}@{}:{}/{}",
                cfg.database.username, cfg.database.host, cfg.database.port, cfg.database.database
            );
            info!(
                "Password: {}",
                if cfg.database.password.is_empty() {
                    "not set"
                } else {
                    "set"
                }
            );
        }
        Backend::Sqlite => info!("SQLite file: {}", cfg.database.path),
    }
    info!(
        "Commit mode: {}",
        if cfg.database.autocommit {
            "autocommit"
        } else {
            "manual"
        }
    );
    info!("Log level: {}", cfg.logging.level());
    info!("Log file: {}", cfg.logging.file());

    Ok(())
}
