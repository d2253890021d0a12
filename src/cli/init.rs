use dblog::error::Result;
use dblog::file_error;
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;

/// 默认配置文件内容
pub const DEFAULT_CONFIG: &str = r#"# dblog 配置文件

[database]
# 存储后端: postgres, sqlite
backend = "postgres"
# PostgreSQL 连接参数（可被 PGHOST/PGPORT/PGUSER/PGPASSWORD/PGDATABASE 覆盖）
host = "localhost"
port = 5432
username = "postgres"
password = ""
database = "postgres"
# SQLite 数据库文件（backend = "sqlite" 时使用）
path = "dblog.db"
# 是否每条事件自动提交
autocommit = false

[logging]
# 诊断日志输出路径
file = "logs/dblog.log"
# 日志级别: trace, debug, info, warn, error
level = "info"
"#;

/// 生成默认配置文件
pub fn handle_init(output_path: &str, force: bool) -> Result<()> {
    let path = Path::new(output_path);

    info!("Generating configuration file: {output_path}");

    let existed = path.exists();
    if existed && !force {
        error!("Configuration file already exists: {output_path}");
        info!("Tip: pass --force to overwrite");
        return Err(file_error!(AlreadyExists {
            path: path.to_path_buf(),
        }));
    }

    if existed {
        warn!("Overwriting existing configuration file");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && !parent.exists()
    {
        info!("Creating directory: {}", parent.display());
        fs::create_dir_all(parent).map_err(|e| {
            file_error!(CreateDirectoryFailed {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    debug!("Writing default configuration...");
    fs::write(path, DEFAULT_CONFIG).map_err(|e| {
        file_error!(WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    })?;

    if existed {
        info!("Configuration file overwritten: {output_path}");
    } else {
        info!("Configuration file created: {output_path}");
    }

    info!("Next steps:");
    info!("  1. Edit the configuration: {output_path}");
    info!("  2. Validate it: dblog validate -c {output_path}");
    info!("  3. Inspect stored logs: dblog query -c {output_path}");

    Ok(())
}
