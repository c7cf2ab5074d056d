//! 配置同步服务 - 拉取 + 确认
//!
//! `fetch` 只读，不改变任何状态；`acknowledge` 在批次交付之后推进游标。
//! 传输层可以先把响应写出去再调用 `acknowledge`，`pull` 则把两步串起来。
//!
//! ## NOTE: 至少一次交付
//!
//! 推进游标失败时 `pull` 仍然返回本批记录，只记录 warn，不重试。
//! 已存储的游标保持旧值，下一次拉取会再次交付同一窗口。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::storage::{ConfigBackend, ConfigRecord};
use crate::utils::time::{Clock, SystemClock};

use super::cursor_store::SyncCursorTracker;

/// 一次拉取的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullBatch {
    pub client_id: String,
    /// 本次查询使用的起点（不含）
    pub cursor: i64,
    /// 按 (update_time, id) 升序
    pub records: Vec<ConfigRecord>,
    /// 拉取时刻，确认后成为新的游标
    pub fetched_at: i64,
}

impl PullBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[derive(Clone)]
pub struct ConfigSyncService {
    backend: Arc<dyn ConfigBackend>,
    tracker: SyncCursorTracker,
    clock: Arc<dyn Clock>,
}

impl ConfigSyncService {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn ConfigBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracker: SyncCursorTracker::new(backend.clone()),
            backend,
            clock,
        }
    }

    pub fn tracker(&self) -> &SyncCursorTracker {
        &self.tracker
    }

    /// 解析游标并查询之后变更的记录，不推进游标
    ///
    /// 未见过的 client_id 会在这里以游标 0 建档。
    pub async fn fetch(&self, client_id: &str, override_cursor: i64) -> Result<PullBatch> {
        let cursor = self.tracker.resolve(client_id, override_cursor).await?;
        let records = self.backend.list_updated_after(cursor).await?;
        let fetched_at = self.clock.now_secs();
        Ok(PullBatch {
            client_id: client_id.to_string(),
            cursor,
            records,
            fetched_at,
        })
    }

    /// 批次交付之后推进游标到拉取时刻
    pub async fn acknowledge(&self, batch: &PullBatch) -> Result<()> {
        self.tracker.advance(&batch.client_id, batch.fetched_at).await
    }

    pub async fn pull(&self, client_id: &str, override_cursor: i64) -> Result<Vec<ConfigRecord>> {
        let batch = self.fetch(client_id, override_cursor).await?;
        info!(
            "同步拉取: client={} cursor={} records={} now={}",
            batch.client_id,
            batch.cursor,
            batch.len(),
            batch.fetched_at
        );
        if let Err(e) = self.acknowledge(&batch).await {
            warn!(
                "推进同步游标失败，下次拉取将重复交付: client={} cursor={} error={}",
                batch.client_id, batch.fetched_at, e
            );
        }
        Ok(batch.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigCenterError;
    use crate::storage::{
        ConfigUpdate, MemoryBackend, NewConfig, SqliteBackend, SyncStatus,
        UpdateOutcome,
    };
    use crate::utils::time::ManualClock;
    use async_trait::async_trait;
    use serde_json::json;

    fn new_config(name: &str) -> NewConfig {
        NewConfig {
            scope: "stock".into(),
            name: name.into(),
            value: json!({"a": 1}).as_object().cloned().unwrap(),
            update_user: "admin".into(),
        }
    }

    fn setup(start: i64) -> (Arc<ManualClock>, Arc<dyn ConfigBackend>, ConfigSyncService) {
        let clock = Arc::new(ManualClock::new(start));
        let backend: Arc<dyn ConfigBackend> =
            Arc::new(SqliteBackend::open_in_memory_with_clock(clock.clone()).unwrap());
        let service = ConfigSyncService::with_clock(backend.clone(), clock.clone());
        (clock, backend, service)
    }

    #[tokio::test]
    async fn second_immediate_pull_is_empty() {
        let (clock, backend, service) = setup(1_000);
        backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(1);
        backend.insert_config(&new_config("b")).await.unwrap();

        let first = service.pull("c1", 0).await.unwrap();
        let names: Vec<&str> = first.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let max_t = first.iter().map(|r| r.update_time).max().unwrap();
        let status = service.tracker().status("c1").await.unwrap();
        assert!(status.update_time >= max_t);

        clock.advance(1);
        assert!(service.pull("c1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn override_zero_uses_stored_cursor_and_small_override_replays() {
        let (clock, backend, service) = setup(1_000);
        backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(5);
        service.pull("c1", 0).await.unwrap();

        clock.advance(5);
        assert!(service.pull("c1", 0).await.unwrap().is_empty());
        // 任意早于首条记录的 override 都会拿到完整历史
        assert_eq!(service.pull("c1", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clients_have_independent_cursors() {
        let (clock, backend, service) = setup(1_000);
        backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(1);

        assert_eq!(service.pull("c1", 0).await.unwrap().len(), 1);
        assert_eq!(service.pull("c2", 0).await.unwrap().len(), 1);
        assert!(service.pull("c1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_within_cursor_second_is_skipped_until_override() {
        let (clock, backend, service) = setup(1_000);
        backend.insert_config(&new_config("a")).await.unwrap();
        assert_eq!(service.pull("c1", 0).await.unwrap().len(), 1);

        // 与游标同一秒写入：update_time == cursor，不满足 > cursor
        backend.insert_config(&new_config("late")).await.unwrap();
        clock.advance(10);
        assert!(service.pull("c1", 0).await.unwrap().is_empty());

        let replay = service.pull("c1", 999).await.unwrap();
        assert!(replay.iter().any(|r| r.name == "late"));
    }

    #[tokio::test]
    async fn fetch_does_not_move_cursor_until_acknowledged() {
        let (clock, backend, service) = setup(1_000);
        backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(1);

        let batch = service.fetch("c1", 0).await.unwrap();
        assert_eq!(batch.cursor, 0);
        assert_eq!(batch.fetched_at, 1_001);
        assert_eq!(service.tracker().status("c1").await.unwrap().update_time, 0);

        service.acknowledge(&batch).await.unwrap();
        assert_eq!(service.tracker().status("c1").await.unwrap().update_time, 1_001);
    }

    #[tokio::test]
    async fn updated_record_is_delivered_again() {
        let (clock, backend, service) = setup(1_000);
        let record = backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(1);
        service.pull("c1", 0).await.unwrap();

        clock.advance(1);
        backend
            .update_config(&ConfigUpdate {
                scope: record.scope.clone(),
                name: record.name.clone(),
                value: record.value.clone(),
                changed_value: record.changed_value.clone(),
                update_user: "bob".into(),
                expected_revision: None,
            })
            .await
            .unwrap();
        clock.advance(1);

        let delta = service.pull("c1", 0).await.unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].update_user, "bob");
    }

    /// 按开关让游标写入或变更查询失败的后端
    struct FaultyBackend {
        inner: MemoryBackend,
        fail_advance: bool,
        fail_query: bool,
    }

    #[async_trait]
    impl ConfigBackend for FaultyBackend {
        async fn insert_config(&self, new: &NewConfig) -> Result<ConfigRecord> {
            self.inner.insert_config(new).await
        }

        async fn update_config(&self, update: &ConfigUpdate) -> Result<UpdateOutcome> {
            self.inner.update_config(update).await
        }

        async fn delete_config(&self, scope: &str, name: &str) -> Result<usize> {
            self.inner.delete_config(scope, name).await
        }

        async fn get_config(&self, scope: &str, name: &str) -> Result<Option<ConfigRecord>> {
            self.inner.get_config(scope, name).await
        }

        async fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
            self.inner.list_by_scope(scope).await
        }

        async fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>> {
            if self.fail_query {
                return Err(ConfigCenterError::Storage("database is locked".into()));
            }
            self.inner.list_updated_after(cursor).await
        }

        async fn load_or_create_sync_status(&self, client_id: &str) -> Result<SyncStatus> {
            self.inner.load_or_create_sync_status(client_id).await
        }

        async fn get_sync_status(&self, client_id: &str) -> Result<Option<SyncStatus>> {
            self.inner.get_sync_status(client_id).await
        }

        async fn save_sync_status(&self, client_id: &str, update_time: i64) -> Result<()> {
            if self.fail_advance {
                return Err(ConfigCenterError::Storage("disk full".into()));
            }
            self.inner.save_sync_status(client_id, update_time).await
        }

        async fn list_sync_status(&self) -> Result<Vec<SyncStatus>> {
            self.inner.list_sync_status().await
        }
    }

    #[tokio::test]
    async fn failed_advance_still_delivers_and_replays() {
        let clock = Arc::new(ManualClock::new(1_000));
        let backend: Arc<dyn ConfigBackend> = Arc::new(FaultyBackend {
            inner: MemoryBackend::with_clock(clock.clone()),
            fail_advance: true,
            fail_query: false,
        });
        let service = ConfigSyncService::with_clock(backend.clone(), clock.clone());
        backend.insert_config(&new_config("a")).await.unwrap();
        clock.advance(1);

        assert_eq!(service.pull("c1", 0).await.unwrap().len(), 1);
        assert_eq!(service.pull("c1", 0).await.unwrap().len(), 1);

        let batch = service.fetch("c1", 0).await.unwrap();
        assert!(service.acknowledge(&batch).await.is_err());
    }

    #[tokio::test]
    async fn failed_query_keeps_stored_cursor() {
        let clock = Arc::new(ManualClock::new(1_000));
        let backend: Arc<dyn ConfigBackend> = Arc::new(FaultyBackend {
            inner: MemoryBackend::with_clock(clock.clone()),
            fail_advance: false,
            fail_query: true,
        });
        let service = ConfigSyncService::with_clock(backend.clone(), clock.clone());
        service.tracker().advance("c1", 42).await.unwrap();
        clock.advance(10);

        let err = service.pull("c1", 0).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
        assert_eq!(service.tracker().status("c1").await.unwrap().update_time, 42);
    }

    #[tokio::test]
    async fn empty_store_pull_creates_status() {
        let (_clock, _backend, service) = setup(1_000);
        assert!(service.pull("fresh", 0).await.unwrap().is_empty());
        assert_eq!(service.tracker().status("fresh").await.unwrap().update_time, 1_000);
    }
}
