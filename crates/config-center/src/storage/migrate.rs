//! configs / sync_status 建表与升级
//!
//! 打开连接后先设置 pragma，再执行嵌入的 migrations。库里已应用的版本
//! 高于 [`DB_VERSION`] 时在迁移之前拒绝打开。

use rusqlite::Connection;

use crate::error::{ConfigCenterError, Result};
use crate::version::DB_VERSION;

mod embedded {
    refinery::embed_migrations!("./migrations");
}

const HISTORY_TABLE: &str = "refinery_schema_history";

const PRAGMAS: &str = "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; \
                       PRAGMA temp_store=MEMORY; PRAGMA busy_timeout=5000;";

/// 打开数据库后的唯一初始化入口
pub fn init_db(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(PRAGMAS)
        .map_err(|e| ConfigCenterError::Storage(format!("设置 PRAGMA 失败: {}", e)))?;

    if let Some(v) = schema_version(conn)?.filter(|&v| v > DB_VERSION) {
        return Err(ConfigCenterError::Storage(format!(
            "数据库结构版本 {} 高于支持的 {}",
            v, DB_VERSION
        )));
    }

    embedded::migrations::runner().run(conn)?;
    Ok(())
}

/// 已应用的最高 migration 版本；从未迁移过返回 None
pub fn schema_version(conn: &Connection) -> Result<Option<i64>> {
    let has_history: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [HISTORY_TABLE],
            |row| row.get(0),
        )
        .map_err(|e| ConfigCenterError::Storage(format!("查询 migration 历史表失败: {}", e)))?;
    if !has_history {
        return Ok(None);
    }

    let version: Option<i64> = conn
        .query_row(
            &format!("SELECT MAX(version) FROM {}", HISTORY_TABLE),
            [],
            |row| row.get(0),
        )
        .map_err(|e| ConfigCenterError::Storage(format!("读取结构版本失败: {}", e)))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_is_at_latest_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), None);
        init_db(&mut conn).unwrap();
        init_db(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), Some(DB_VERSION));
    }

    #[test]
    fn refuses_database_written_by_newer_build() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_db(&mut conn).unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (version, name, applied_on, checksum) VALUES (?1, 'future', '', '0')",
                HISTORY_TABLE
            ),
            [DB_VERSION + 1],
        )
        .unwrap();

        let err = init_db(&mut conn).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
        assert!(err.to_string().contains("高于支持的"));
    }
}
