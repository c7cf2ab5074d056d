//! 进程内存储后端
//!
//! 语义与 [`SqliteBackend`](super::SqliteBackend) 一致（自增 id、update_time 单调、
//! CAS、按 (update_time, id) 排序），用于测试与无需落盘的嵌入场景。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{ConfigCenterError, Result};
use crate::storage::entities::{ConfigRecord, ConfigUpdate, NewConfig, SyncStatus, UpdateOutcome};
use crate::storage::ConfigBackend;
use crate::utils::time::{Clock, SystemClock};

#[derive(Default)]
struct Tables {
    next_config_id: i64,
    /// (scope, name) -> 记录
    configs: BTreeMap<(String, String), ConfigRecord>,
    next_status_id: i64,
    sync_status: BTreeMap<String, SyncStatus>,
}

pub struct MemoryBackend {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    pub fn config_count(&self) -> usize {
        self.tables.read().configs.len()
    }
}

fn key(scope: &str, name: &str) -> (String, String) {
    (scope.to_string(), name.to_string())
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn insert_config(&self, new: &NewConfig) -> Result<ConfigRecord> {
        let now = self.clock.now_secs();
        let mut tables = self.tables.write();
        let k = key(&new.scope, &new.name);
        if tables.configs.contains_key(&k) {
            return Err(ConfigCenterError::Conflict(format!(
                "配置已存在: {}/{}",
                new.scope, new.name
            )));
        }
        tables.next_config_id += 1;
        let record = ConfigRecord {
            id: tables.next_config_id,
            scope: new.scope.clone(),
            name: new.name.clone(),
            value: new.value.clone(),
            changed_value: new.value.clone(),
            create_time: now,
            update_time: now,
            update_user: new.update_user.clone(),
            revision: 1,
        };
        tables.configs.insert(k, record.clone());
        Ok(record)
    }

    async fn update_config(&self, update: &ConfigUpdate) -> Result<UpdateOutcome> {
        let now = self.clock.now_secs();
        let mut tables = self.tables.write();
        let Some(record) = tables.configs.get_mut(&key(&update.scope, &update.name)) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if let Some(expected) = update.expected_revision {
            if record.revision != expected {
                return Ok(UpdateOutcome::RevisionMismatch {
                    current: record.revision,
                });
            }
        }
        record.value = update.value.clone();
        record.changed_value = update.changed_value.clone();
        record.update_user = update.update_user.clone();
        record.update_time = record.update_time.max(now);
        record.revision += 1;
        Ok(UpdateOutcome::Updated(record.clone()))
    }

    async fn delete_config(&self, scope: &str, name: &str) -> Result<usize> {
        let removed = self.tables.write().configs.remove(&key(scope, name));
        Ok(usize::from(removed.is_some()))
    }

    async fn get_config(&self, scope: &str, name: &str) -> Result<Option<ConfigRecord>> {
        Ok(self.tables.read().configs.get(&key(scope, name)).cloned())
    }

    async fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
        let tables = self.tables.read();
        let mut records: Vec<ConfigRecord> = tables
            .configs
            .values()
            .filter(|r| r.scope == scope)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>> {
        let tables = self.tables.read();
        let mut records: Vec<ConfigRecord> = tables
            .configs
            .values()
            .filter(|r| r.update_time > cursor)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.update_time, r.id));
        Ok(records)
    }

    async fn load_or_create_sync_status(&self, client_id: &str) -> Result<SyncStatus> {
        let mut tables = self.tables.write();
        if let Some(status) = tables.sync_status.get(client_id) {
            return Ok(status.clone());
        }
        tables.next_status_id += 1;
        let status = SyncStatus {
            id: tables.next_status_id,
            client_id: client_id.to_string(),
            update_time: 0,
        };
        tables.sync_status.insert(client_id.to_string(), status.clone());
        Ok(status)
    }

    async fn get_sync_status(&self, client_id: &str) -> Result<Option<SyncStatus>> {
        Ok(self.tables.read().sync_status.get(client_id).cloned())
    }

    async fn save_sync_status(&self, client_id: &str, update_time: i64) -> Result<()> {
        let mut tables = self.tables.write();
        if let Some(status) = tables.sync_status.get_mut(client_id) {
            status.update_time = update_time;
            return Ok(());
        }
        tables.next_status_id += 1;
        let status = SyncStatus {
            id: tables.next_status_id,
            client_id: client_id.to_string(),
            update_time,
        };
        tables.sync_status.insert(client_id.to_string(), status);
        Ok(())
    }

    async fn list_sync_status(&self) -> Result<Vec<SyncStatus>> {
        let mut statuses: Vec<SyncStatus> =
            self.tables.read().sync_status.values().cloned().collect();
        statuses.sort_by_key(|s| s.id);
        Ok(statuses)
    }
}
