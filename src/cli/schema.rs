use dblog::config::Backend;
use dblog::error::Result;
use dblog::schema;
use std::io::{self, Write};

/// 打印参考表结构
pub fn handle_schema(backend: Backend) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(schema::ddl(backend).as_bytes())?;
    out.flush()?;
    Ok(())
}
