pub mod emit;
pub mod init;
pub mod opts;
pub mod query;
pub mod schema;
pub mod validate;
