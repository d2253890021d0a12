use dblog::config::Config;
use dblog::error::Result;
use dblog::{print_all_logs, store};
use log::info;
use std::time::Instant;

/// 连接、打印全部日志、断开
pub fn handle_query(cfg: &Config) -> Result<()> {
    let start = Instant::now();

    let store = store::connect(&cfg.database)?;
    let mut store = store.borrow_mut();
    info!("Querying log events from {}", store.backend());

    let count = print_all_logs(&mut *store)?;

    info!(
        "Printed {} log event(s) in {:.3} seconds",
        count,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
