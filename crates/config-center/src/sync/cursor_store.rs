//! 同步游标 - 每个 client_id 一条 sync_status 记录

use std::sync::Arc;

use tracing::debug;

use crate::error::{ConfigCenterError, Result};
use crate::storage::{ConfigBackend, SyncStatus};
use crate::validation::validate_identifier;

/// 存储 client_id 的已确认游标
#[derive(Clone)]
pub struct SyncCursorTracker {
    backend: Arc<dyn ConfigBackend>,
}

impl SyncCursorTracker {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }

    /// 解析本次拉取的起点：未见过的客户端以 0 建档，非零 override 优先
    pub async fn resolve(&self, client_id: &str, override_cursor: i64) -> Result<i64> {
        validate_identifier("client_id", client_id)?;
        let status = self.backend.load_or_create_sync_status(client_id).await?;
        let cursor = if override_cursor != 0 {
            override_cursor
        } else {
            status.update_time
        };
        debug!(
            "解析同步游标: client={} stored={} override={} -> {}",
            client_id, status.update_time, override_cursor, cursor
        );
        Ok(cursor)
    }

    pub async fn advance(&self, client_id: &str, cursor: i64) -> Result<()> {
        validate_identifier("client_id", client_id)?;
        self.backend.save_sync_status(client_id, cursor).await
    }

    pub async fn status(&self, client_id: &str) -> Result<SyncStatus> {
        validate_identifier("client_id", client_id)?;
        self.backend
            .get_sync_status(client_id)
            .await?
            .ok_or_else(|| ConfigCenterError::NotFound(format!("同步客户端不存在: {}", client_id)))
    }

    /// 按 id 升序
    pub async fn list_all(&self) -> Result<Vec<SyncStatus>> {
        self.backend.list_sync_status().await
    }
}
