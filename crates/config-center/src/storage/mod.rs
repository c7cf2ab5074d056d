//! 存储模块 - 配置中心的数据持久化层
//!
//! 采用分层架构设计：
//! - [`ConfigBackend`]: 持久化协作方的抽象，所有组件在构造时注入同一个句柄
//! - [`SqliteBackend`]: 基于 SQLite 的实现（refinery 迁移 + DAO）
//! - [`MemoryBackend`]: 进程内实现，测试和嵌入场景使用
//! - DAO Layer / Entities: 每张表一个操作模块，类型安全的数据实体

use async_trait::async_trait;

use crate::error::Result;

pub mod dao;
pub mod entities;
pub mod memory;
pub mod migrate;
pub mod sqlite;

pub use dao::{DaoFactory, TransactionManager};
pub use entities::*;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// 持久化协作方
///
/// 每个方法对应一条参数化的 SQL 语义操作；时间戳（create_time / update_time）
/// 由实现方按自己的时钟填写，调用方不传入。
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// 插入新记录；(scope, name) 已存在时返回 Conflict
    async fn insert_config(&self, new: &NewConfig) -> Result<ConfigRecord>;

    /// 写回合并后的 value / changed_value / update_user，刷新 update_time
    async fn update_config(&self, update: &ConfigUpdate) -> Result<UpdateOutcome>;

    /// 按键硬删除，返回删除的行数（0 不是错误）
    async fn delete_config(&self, scope: &str, name: &str) -> Result<usize>;

    async fn get_config(&self, scope: &str, name: &str) -> Result<Option<ConfigRecord>>;

    /// 按 id 升序
    async fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>>;

    /// update_time > cursor，按 (update_time, id) 升序
    async fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>>;

    /// 读取客户端同步状态，不存在时以游标 0 建档
    async fn load_or_create_sync_status(&self, client_id: &str) -> Result<SyncStatus>;

    async fn get_sync_status(&self, client_id: &str) -> Result<Option<SyncStatus>>;

    /// 持久化客户端游标（upsert）
    async fn save_sync_status(&self, client_id: &str, update_time: i64) -> Result<()>;

    /// 按 id 升序
    async fn list_sync_status(&self) -> Result<Vec<SyncStatus>>;
}
