//! 配置 DAO - configs 表
//!
//! value / changed_value 以 JSON 文本落库，读取时立即解码为 [`JsonObject`]，
//! 写入前立即编码；DAO 之外不出现原始 JSON 文本。

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ConfigCenterError, Result};
use crate::storage::dao::db_error;
use crate::storage::entities::{ConfigRecord, ConfigUpdate, JsonObject, NewConfig};

const CONFIG_COLUMNS: &str =
    "id, scope, name, value, changed_value, create_time, update_time, update_user, revision";

pub struct ConfigDao<'a> {
    conn: &'a Connection,
}

impl<'a> ConfigDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 插入新配置，changed_value 初始化为 value；(scope, name) 冲突返回 Conflict
    pub fn insert(&self, new: &NewConfig, now: i64) -> Result<i64> {
        let value = encode_object(&new.value)?;
        let sql = r#"
            INSERT INTO configs (scope, name, value, changed_value, create_time, update_time, update_user, revision)
            VALUES (?1, ?2, ?3, ?3, ?4, ?4, ?5, 1)
        "#;
        match self
            .conn
            .execute(sql, params![new.scope, new.name, value, now, new.update_user])
        {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(ConfigCenterError::Conflict(format!(
                    "配置已存在: {}/{}",
                    new.scope, new.name
                )))
            }
            Err(e) => Err(db_error("插入配置", e)),
        }
    }

    pub fn get(&self, scope: &str, name: &str) -> Result<Option<ConfigRecord>> {
        let sql = format!(
            "SELECT {} FROM configs WHERE scope = ?1 AND name = ?2",
            CONFIG_COLUMNS
        );
        let raw = self
            .conn
            .query_row(&sql, params![scope, name], row_to_raw)
            .optional()
            .map_err(|e| db_error("查询配置", e))?;
        raw.map(RawConfigRow::decode).transpose()
    }

    pub fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
        let sql = format!(
            "SELECT {} FROM configs WHERE scope = ?1 ORDER BY id ASC",
            CONFIG_COLUMNS
        );
        self.query_records("按 scope 查询配置", &sql, params![scope])
    }

    /// update_time 严格大于游标的记录，按 (update_time, id) 升序
    pub fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>> {
        let sql = format!(
            "SELECT {} FROM configs WHERE update_time > ?1 ORDER BY update_time ASC, id ASC",
            CONFIG_COLUMNS
        );
        self.query_records("查询增量配置", &sql, params![cursor])
    }

    /// 写回合并结果；update_time 取 max(now, 原值) 保证单调，revision +1。
    /// expected_revision 为 Some 时附加 CAS 条件。返回受影响行数。
    pub fn update_values(&self, update: &ConfigUpdate, now: i64) -> Result<usize> {
        let value = encode_object(&update.value)?;
        let changed_value = encode_object(&update.changed_value)?;
        let sql = r#"
            UPDATE configs SET
                value = ?1,
                changed_value = ?2,
                update_user = ?3,
                update_time = MAX(?4, update_time),
                revision = revision + 1
            WHERE scope = ?5 AND name = ?6 AND (?7 IS NULL OR revision = ?7)
        "#;
        let affected = self.conn.execute(
            sql,
            params![
                value,
                changed_value,
                update.update_user,
                now,
                update.scope,
                update.name,
                update.expected_revision,
            ],
        )
        .map_err(|e| db_error("更新配置", e))?;
        Ok(affected)
    }

    pub fn current_revision(&self, scope: &str, name: &str) -> Result<Option<i64>> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM configs WHERE scope = ?1 AND name = ?2",
                params![scope, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_error("查询配置 revision", e))?;
        Ok(revision)
    }

    /// 硬删除，返回受影响行数（0 不视为错误）
    pub fn delete(&self, scope: &str, name: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM configs WHERE scope = ?1 AND name = ?2",
                params![scope, name],
            )
            .map_err(|e| db_error("删除配置", e))?;
        Ok(affected)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM configs", [], |r| r.get(0))
            .map_err(|e| db_error("统计配置", e))?;
        Ok(n as u64)
    }

    fn query_records<P: rusqlite::Params>(
        &self,
        context: &str,
        sql: &str,
        params: P,
    ) -> Result<Vec<ConfigRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| db_error(context, e))?;
        let rows = stmt
            .query_map(params, row_to_raw)
            .map_err(|e| db_error(context, e))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(raw.map_err(|e| db_error(context, e))?.decode()?);
        }
        Ok(out)
    }
}

/// 未解码的行，JSON 列保持文本
struct RawConfigRow {
    id: i64,
    scope: String,
    name: String,
    value: Option<String>,
    changed_value: Option<String>,
    create_time: i64,
    update_time: i64,
    update_user: String,
    revision: i64,
}

impl RawConfigRow {
    fn decode(self) -> Result<ConfigRecord> {
        Ok(ConfigRecord {
            value: decode_object(self.value.as_deref(), "value")?,
            changed_value: decode_object(self.changed_value.as_deref(), "changed_value")?,
            id: self.id,
            scope: self.scope,
            name: self.name,
            create_time: self.create_time,
            update_time: self.update_time,
            update_user: self.update_user,
            revision: self.revision,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawConfigRow> {
    Ok(RawConfigRow {
        id: row.get(0)?,
        scope: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        changed_value: row.get(4)?,
        create_time: row.get(5)?,
        update_time: row.get(6)?,
        update_user: row.get(7)?,
        revision: row.get(8)?,
    })
}

pub(crate) fn encode_object(object: &JsonObject) -> Result<String> {
    serde_json::to_string(object)
        .map_err(|e| ConfigCenterError::Serialization(format!("编码 JSON 失败: {}", e)))
}

/// NULL 或 JSON null 视为空对象；非对象的 JSON 视为损坏数据
pub(crate) fn decode_object(text: Option<&str>, column: &str) -> Result<JsonObject> {
    let Some(text) = text else {
        return Ok(JsonObject::new());
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(serde_json::Value::Null) => Ok(JsonObject::new()),
        Ok(other) => Err(ConfigCenterError::Serialization(format!(
            "{} 列不是 JSON 对象: {}",
            column, other
        ))),
        Err(e) => Err(ConfigCenterError::Serialization(format!(
            "解码 {} 列失败: {}",
            column, e
        ))),
    }
}
