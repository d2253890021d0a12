#![allow(dead_code)]

use dblog::schema::SQLITE_DDL;
use dblog::{SharedStore, SqliteStore, shared};
use std::path::Path;

/// 内存数据库，已建表
pub fn memory_store() -> SharedStore<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("open in-memory database");
    store
        .connection()
        .execute_batch(SQLITE_DDL)
        .expect("install schema");
    shared(store)
}

/// 在文件数据库中建表
pub fn install_schema(path: &Path) {
    let store = SqliteStore::open(path).expect("open database file");
    store
        .connection()
        .execute_batch(SQLITE_DDL)
        .expect("install schema");
}

/// 统计表中行数（包括本连接未提交的行）
pub fn count(store: &SharedStore<SqliteStore>, table: &str) -> i64 {
    count_on(&store.borrow(), table)
}

pub fn count_on(store: &SqliteStore, table: &str) -> i64 {
    store
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .expect("count rows")
}

/// `(level, application_id, identifier_id, message)`，按 id 排序
pub fn events(store: &SharedStore<SqliteStore>) -> Vec<(i64, i32, i32, String)> {
    let store = store.borrow();
    let mut stmt = store
        .connection()
        .prepare("SELECT level, application_id, identifier_id, message FROM log_events ORDER BY id")
        .expect("prepare select");
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
        .expect("query events")
        .collect::<Result<Vec<_>, _>>()
        .expect("read events");
    rows
}
