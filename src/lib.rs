//! Leveled log events stored in PostgreSQL or SQLite, with application names
//! and identifiers normalized into lookup tables.
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod level;
pub mod logger;
pub mod logging;
pub mod query;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use level::Level;
pub use logger::Logger;
pub use query::{print_all_logs, write_all_logs};
#[cfg(feature = "postgres")]
pub use store::PgStore;
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{LogStore, SharedStore, shared};
