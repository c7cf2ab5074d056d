//! 同步状态 DAO - sync_status 表（每个客户端一个游标）

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::storage::dao::db_error;
use crate::storage::entities::SyncStatus;

pub struct SyncStatusDao<'a> {
    conn: &'a Connection,
}

impl<'a> SyncStatusDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, client_id: &str) -> Result<Option<SyncStatus>> {
        let status = self
            .conn
            .query_row(
                "SELECT id, client_id, update_time FROM sync_status WHERE client_id = ?1",
                params![client_id],
                row_to_status,
            )
            .optional()
            .map_err(|e| db_error("查询同步状态", e))?;
        Ok(status)
    }

    /// 客户端首次出现时以游标 0 建档；已存在则不动
    pub fn insert_if_absent(&self, client_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_status (client_id, update_time) VALUES (?1, 0) ON CONFLICT(client_id) DO NOTHING",
            params![client_id],
        )
        .map_err(|e| db_error("创建同步状态", e))?;
        Ok(())
    }

    pub fn upsert(&self, client_id: &str, update_time: i64) -> Result<()> {
        let sql = r#"
            INSERT INTO sync_status (client_id, update_time)
            VALUES (?1, ?2)
            ON CONFLICT(client_id) DO UPDATE SET
                update_time = excluded.update_time
        "#;
        self.conn
            .execute(sql, params![client_id, update_time])
            .map_err(|e| db_error("保存同步状态", e))?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<SyncStatus>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, client_id, update_time FROM sync_status ORDER BY id ASC")
            .map_err(|e| db_error("查询同步状态列表", e))?;
        let rows = stmt
            .query_map([], row_to_status)
            .map_err(|e| db_error("查询同步状态列表", e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| db_error("读取同步状态", e))
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncStatus> {
    Ok(SyncStatus {
        id: row.get(0)?,
        client_id: row.get(1)?,
        update_time: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrate::init_db;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_db(&mut conn).unwrap();
        conn
    }

    #[test]
    fn insert_if_absent_keeps_existing_cursor() {
        let conn = conn();
        let dao = SyncStatusDao::new(&conn);
        dao.insert_if_absent("c1").unwrap();
        assert_eq!(dao.get("c1").unwrap().unwrap().update_time, 0);

        dao.upsert("c1", 42).unwrap();
        dao.insert_if_absent("c1").unwrap();
        assert_eq!(dao.get("c1").unwrap().unwrap().update_time, 42);
    }

    #[test]
    fn list_in_creation_order() {
        let conn = conn();
        let dao = SyncStatusDao::new(&conn);
        dao.upsert("b", 2).unwrap();
        dao.insert_if_absent("a").unwrap();
        let ids: Vec<String> = dao.list().unwrap().into_iter().map(|s| s.client_id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(dao.get("missing").unwrap().is_none());
    }

    #[test]
    fn upsert_failure_names_the_operation() {
        let conn = conn();
        conn.execute_batch("DROP TABLE sync_status").unwrap();
        let err = SyncStatusDao::new(&conn).upsert("c1", 1).unwrap_err();
        assert!(err.to_string().contains("保存同步状态失败"), "{}", err);
    }
}
