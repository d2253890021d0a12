use dblog::config::Config;
use dblog::error::Result;
use dblog::{Level, Logger, store};
use log::info;
use std::fmt::Display;

/// 写入一条事件并提交
pub fn handle_emit(
    cfg: &Config,
    app: &str,
    identifier: &str,
    level: Level,
    message: &str,
    args: &[String],
) -> Result<()> {
    let store = store::connect(&cfg.database)?;
    let mut logger = Logger::new(app, identifier, store.clone());
    logger.prepare()?;

    let args: Vec<&dyn Display> = args.iter().map(|a| a as &dyn Display).collect();
    logger.print_fmt(level, message, &args)?;
    store.borrow_mut().commit()?;
    logger.close();

    info!("Wrote {level} event for {app}/{identifier}");
    Ok(())
}
