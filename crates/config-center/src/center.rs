//! ConfigCenter - 配置中心门面
//!
//! 把实体存储、同步服务围绕同一个注入的后端组装起来，对外提供
//! 增删改查、增量拉取和同步状态查询。

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigCenterConfig, UpdateStrategy};
use crate::error::Result;
use crate::logging::init_logging;
use crate::storage::{ConfigBackend, ConfigRecord, JsonObject, SqliteBackend, SyncStatus};
use crate::store::ConfigStore;
use crate::sync::{ConfigSyncService, PullBatch};
use crate::utils::time::{Clock, SystemClock};
use crate::version::{CRATE_VERSION, DB_VERSION, GIT_SHA};

#[derive(Clone)]
pub struct ConfigCenter {
    backend: Arc<dyn ConfigBackend>,
    store: ConfigStore,
    sync: ConfigSyncService,
}

impl ConfigCenter {
    /// 按配置打开 SQLite 后端、执行迁移并组装各组件
    pub async fn open(config: ConfigCenterConfig) -> Result<Self> {
        config.validate()?;
        init_logging(&config.log.level)?;
        info!(
            "正在初始化 ConfigCenter v{} (git {}, schema v{})",
            CRATE_VERSION, GIT_SHA, DB_VERSION
        );

        let backend: Arc<dyn ConfigBackend> = match config.database_path() {
            Some(path) => Arc::new(SqliteBackend::open(&path).await?),
            None => {
                info!("使用内存数据库，进程退出后数据丢失");
                Arc::new(SqliteBackend::open_in_memory()?)
            }
        };

        let center = Self::with_backend(backend)
            .with_update_strategy(config.update_strategy, config.max_update_retries);
        info!("✅ ConfigCenter 初始化完成 (update_strategy={:?})", config.update_strategy);
        Ok(center)
    }

    /// 注入任意后端，使用系统时钟和默认的读-合并-写策略
    pub fn with_backend(backend: Arc<dyn ConfigBackend>) -> Self {
        Self::with_backend_and_clock(backend, Arc::new(SystemClock))
    }

    /// clock 只决定拉取时刻；记录的时间戳由后端自己的时钟填写
    pub fn with_backend_and_clock(backend: Arc<dyn ConfigBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: ConfigStore::new(backend.clone()),
            sync: ConfigSyncService::with_clock(backend.clone(), clock),
            backend,
        }
    }

    pub fn with_update_strategy(mut self, strategy: UpdateStrategy, max_retries: u32) -> Self {
        self.store = self.store.with_strategy(strategy, max_retries);
        self
    }

    pub fn backend(&self) -> &Arc<dyn ConfigBackend> {
        &self.backend
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn sync(&self) -> &ConfigSyncService {
        &self.sync
    }

    // ========== 配置增删改查 ==========

    pub async fn create_config(
        &self,
        scope: &str,
        name: &str,
        value: JsonObject,
        update_user: &str,
    ) -> Result<ConfigRecord> {
        self.store.create(scope, name, value, update_user).await
    }

    pub async fn update_config(
        &self,
        scope: &str,
        name: &str,
        partial: &JsonObject,
        update_user: &str,
    ) -> Result<ConfigRecord> {
        self.store.update(scope, name, partial, update_user).await
    }

    pub async fn delete_config(&self, scope: &str, name: &str) -> Result<()> {
        self.store.delete(scope, name).await
    }

    pub async fn get_configs(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
        self.store.list_by_scope(scope).await
    }

    pub async fn get_config(&self, scope: &str, name: &str) -> Result<ConfigRecord> {
        self.store.get(scope, name).await
    }

    // ========== 增量同步 ==========

    /// override_cursor 为 0 时使用客户端已存储的游标
    pub async fn pull_changes(
        &self,
        client_id: &str,
        override_cursor: i64,
    ) -> Result<Vec<ConfigRecord>> {
        self.sync.pull(client_id, override_cursor).await
    }

    pub async fn fetch_changes(&self, client_id: &str, override_cursor: i64) -> Result<PullBatch> {
        self.sync.fetch(client_id, override_cursor).await
    }

    pub async fn acknowledge(&self, batch: &PullBatch) -> Result<()> {
        self.sync.acknowledge(batch).await
    }

    pub async fn get_all_sync_status(&self) -> Result<Vec<SyncStatus>> {
        self.sync.tracker().list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{GlobalConfigPatch, StockConfigPatch, GLOBAL, STOCK};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_file_database_and_reopen() {
        let dir = TempDir::new().unwrap();
        let config = ConfigCenterConfig::builder().data_dir(dir.path()).build();

        let center = ConfigCenter::open(config.clone()).await.unwrap();
        let value = StockConfigPatch::default()
            .prod_status(true)
            .up_limit(10.5)
            .into_object()
            .unwrap();
        center.create_config(STOCK, "600000", value, "alice").await.unwrap();
        drop(center);

        let center = ConfigCenter::open(config).await.unwrap();
        let record = center.get_config(STOCK, "600000").await.unwrap();
        assert_eq!(record.value.get("prod_status"), Some(&json!(true)));
        assert!(dir.path().join("config_center.db").exists());
    }

    #[tokio::test]
    async fn open_in_memory_round_trip() {
        let config = ConfigCenterConfig::builder().in_memory().build();
        let center = ConfigCenter::open(config).await.unwrap();

        center
            .create_config("global", "switch", json!({"a": 1}).as_object().cloned().unwrap(), "")
            .await
            .unwrap();
        let patch = json!({"b": 2}).as_object().cloned().unwrap();
        let record = center.update_config("global", "switch", &patch, "").await.unwrap();
        assert_eq!(record.update_user, "admin");
        assert_eq!(record.value, json!({"a": 1, "b": 2}).as_object().cloned().unwrap());

        assert_eq!(center.pull_changes("c1", 0).await.unwrap().len(), 1);
        let statuses = center.get_all_sync_status().await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].client_id, "c1");
    }

    #[tokio::test]
    async fn global_broker_is_switched_by_patch() {
        let center = ConfigCenter::with_backend(Arc::new(crate::storage::MemoryBackend::new()));
        let initial = GlobalConfigPatch::default().broker("citic").into_object().unwrap();
        center.create_config(GLOBAL, "trade", initial, "alice").await.unwrap();

        let patch = GlobalConfigPatch::default().broker("htsc").into_object().unwrap();
        let record = center.update_config(GLOBAL, "trade", &patch, "bob").await.unwrap();
        assert_eq!(record.value.get("broker"), Some(&json!("htsc")));
        assert_eq!(center.get_configs(GLOBAL).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_rejects_invalid_config() {
        let config = ConfigCenterConfig::builder()
            .in_memory()
            .log_level("loud")
            .build();
        let err = ConfigCenter::open(config).await.err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
