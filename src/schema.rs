//! 参考表结构
//!
//! The library assumes these tables already exist and never creates them
//! itself. The DDL here is what `dblog schema` prints and what the test suite
//! installs into scratch databases.

use crate::config::Backend;

/// PostgreSQL 表结构
pub const POSTGRES_DDL: &str = r#"CREATE TABLE IF NOT EXISTS log_applications (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log_identifiers (
    id SERIAL PRIMARY KEY,
    "identifier" TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log_events (
    id SERIAL PRIMARY KEY,
    level INTEGER NOT NULL CHECK (level BETWEEN 0 AND 4),
    application_id INTEGER NOT NULL REFERENCES log_applications (id),
    identifier_id INTEGER NOT NULL REFERENCES log_identifiers (id),
    message TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS log_events_created_at_idx ON log_events (created_at);
"#;

/// SQLite 表结构（毫秒精度时间戳）
pub const SQLITE_DDL: &str = r#"CREATE TABLE IF NOT EXISTS log_applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log_identifiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    "identifier" TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS log_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    level INTEGER NOT NULL CHECK (level BETWEEN 0 AND 4),
    application_id INTEGER NOT NULL REFERENCES log_applications (id),
    identifier_id INTEGER NOT NULL REFERENCES log_identifiers (id),
    message TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS log_events_created_at_idx ON log_events (created_at);
"#;

/// 获取指定后端的表结构
pub fn ddl(backend: Backend) -> &'static str {
    match backend {
        Backend::Postgres => POSTGRES_DDL,
        Backend::Sqlite => SQLITE_DDL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{APPLICATIONS_TABLE, EVENTS_TABLE, IDENTIFIERS_TABLE};

    #[test]
    fn test_ddl_names_all_tables() {
        for backend in [Backend::Postgres, Backend::Sqlite] {
            let sql = ddl(backend);
            assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {APPLICATIONS_TABLE}")));
            assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {IDENTIFIERS_TABLE}")));
            assert!(sql.contains(&format!("CREATE TABLE IF NOT EXISTS {EVENTS_TABLE}")));
            assert!(sql.contains("name TEXT NOT NULL UNIQUE"));
        }
    }

    #[test]
    fn test_postgres_timestamp_default() {
        assert!(POSTGRES_DDL.contains("created_at TIMESTAMP NOT NULL DEFAULT now()"));
        assert!(POSTGRES_DDL.contains("SERIAL PRIMARY KEY"));
    }
}
