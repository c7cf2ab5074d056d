//! 数据实体定义 - 对应数据库表结构
//!
//! JSON 列（value / changed_value）在 DAO 边界完成编解码，
//! 这里的结构体只持有结构化的 [`JsonObject`]。

use serde::{Deserialize, Serialize};

/// 配置值：字段名 → 任意 JSON 值
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// 配置实体 - 对应 configs 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// 本地主键（自增），用于同一 update_time 下的稳定排序
    pub id: i64,
    pub scope: String,
    pub name: String,
    /// 当前生效的完整配置
    pub value: JsonObject,
    /// 创建以来所有被写入过的字段（只增不减）
    pub changed_value: JsonObject,
    /// Unix 秒
    pub create_time: i64,
    /// Unix 秒，同步水位线，由存储层维护且单调不减
    pub update_time: i64,
    pub update_user: String,
    /// 写入计数，从 1 开始，每次更新 +1
    pub revision: i64,
}

/// 新建配置的插入参数
#[derive(Debug, Clone)]
pub struct NewConfig {
    pub scope: String,
    pub name: String,
    pub value: JsonObject,
    pub update_user: String,
}

/// 合并后的整行写回参数
#[derive(Debug, Clone)]
pub struct ConfigUpdate {
    pub scope: String,
    pub name: String,
    pub value: JsonObject,
    pub changed_value: JsonObject,
    pub update_user: String,
    /// Some 时仅当存储中的 revision 相等才写入（CAS）
    pub expected_revision: Option<i64>,
}

/// 写回结果
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(ConfigRecord),
    NotFound,
    /// CAS 失败：读取之后记录已被其他写者修改
    RevisionMismatch { current: i64 },
}

/// 同步状态实体 - 对应 sync_status 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub id: i64,
    pub client_id: String,
    /// 客户端已确认的游标（Unix 秒）
    pub update_time: i64,
}
