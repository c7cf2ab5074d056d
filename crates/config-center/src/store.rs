//! 配置实体存储 - Create / Get / List / Update / Delete
//!
//! 所有操作只经由注入的 [`ConfigBackend`]；Update 固定为
//! “读取已有记录 → 合并 → 写回”的形状，写回策略见 [`UpdateStrategy`]。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::UpdateStrategy;
use crate::error::{ConfigCenterError, Result};
use crate::merge::merge_partial;
use crate::storage::{ConfigBackend, ConfigRecord, ConfigUpdate, JsonObject, NewConfig, UpdateOutcome};
use crate::validation::{normalize_update_user, validate_identifier};

#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn ConfigBackend>,
    strategy: UpdateStrategy,
    max_retries: u32,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self {
            backend,
            strategy: UpdateStrategy::ReadModifyWrite,
            max_retries: 3,
        }
    }

    pub fn with_strategy(mut self, strategy: UpdateStrategy, max_retries: u32) -> Self {
        self.strategy = strategy;
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    pub fn backend(&self) -> &Arc<dyn ConfigBackend> {
        &self.backend
    }

    /// 新建配置；(scope, name) 已存在返回 Conflict
    pub async fn create(
        &self,
        scope: &str,
        name: &str,
        value: JsonObject,
        update_user: &str,
    ) -> Result<ConfigRecord> {
        validate_identifier("scope", scope)?;
        validate_identifier("name", name)?;
        let update_user = normalize_update_user(update_user)?;

        let record = self
            .backend
            .insert_config(&NewConfig {
                scope: scope.to_string(),
                name: name.to_string(),
                value,
                update_user,
            })
            .await?;
        info!(
            "配置已创建: {}/{} id={} user={}",
            record.scope, record.name, record.id, record.update_user
        );
        Ok(record)
    }

    pub async fn get(&self, scope: &str, name: &str) -> Result<ConfigRecord> {
        validate_identifier("scope", scope)?;
        validate_identifier("name", name)?;
        self.backend
            .get_config(scope, name)
            .await?
            .ok_or_else(|| ConfigCenterError::NotFound(format!("配置不存在: {}/{}", scope, name)))
    }

    pub async fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
        validate_identifier("scope", scope)?;
        self.backend.list_by_scope(scope).await
    }

    pub async fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>> {
        self.backend.list_updated_after(cursor).await
    }

    /// 部分更新：不存在返回 NotFound（不做 upsert），空载荷返回 Validation
    pub async fn update(
        &self,
        scope: &str,
        name: &str,
        partial: &JsonObject,
        update_user: &str,
    ) -> Result<ConfigRecord> {
        validate_identifier("scope", scope)?;
        validate_identifier("name", name)?;
        let update_user = normalize_update_user(update_user)?;
        if partial.is_empty() {
            return Err(ConfigCenterError::Validation("nothing to update".to_string()));
        }

        let attempts = match self.strategy {
            UpdateStrategy::ReadModifyWrite => 1,
            UpdateStrategy::CompareAndSet => self.max_retries,
        };

        for attempt in 1..=attempts {
            let existing = self.get(scope, name).await?;
            let merged = merge_partial(&existing.value, &existing.changed_value, partial)?;
            let expected_revision = match self.strategy {
                UpdateStrategy::ReadModifyWrite => None,
                UpdateStrategy::CompareAndSet => Some(existing.revision),
            };

            let outcome = self
                .backend
                .update_config(&ConfigUpdate {
                    scope: scope.to_string(),
                    name: name.to_string(),
                    value: merged.value,
                    changed_value: merged.changed_value,
                    update_user: update_user.clone(),
                    expected_revision,
                })
                .await?;

            match outcome {
                UpdateOutcome::Updated(record) => {
                    info!(
                        "配置已更新: {}/{} revision={} fields={:?} user={}",
                        record.scope,
                        record.name,
                        record.revision,
                        partial.keys().collect::<Vec<_>>(),
                        record.update_user
                    );
                    return Ok(record);
                }
                UpdateOutcome::NotFound => {
                    return Err(ConfigCenterError::NotFound(format!(
                        "配置不存在: {}/{}",
                        scope, name
                    )));
                }
                UpdateOutcome::RevisionMismatch { current } => {
                    warn!(
                        "配置并发修改，重新合并: {}/{} expected={} current={} attempt={}/{}",
                        scope, name, existing.revision, current, attempt, attempts
                    );
                }
            }
        }

        Err(ConfigCenterError::Conflict(format!(
            "配置并发修改，{} 次重试后放弃: {}/{}",
            attempts, scope, name
        )))
    }

    /// 硬删除；记录不存在时同样返回成功，便于重试
    pub async fn delete(&self, scope: &str, name: &str) -> Result<()> {
        validate_identifier("scope", scope)?;
        validate_identifier("name", name)?;
        let affected = self.backend.delete_config(scope, name).await?;
        if affected == 0 {
            debug!("删除的配置不存在，视为成功: {}/{}", scope, name);
        } else {
            info!("配置已删除: {}/{}", scope, name);
        }
        Ok(())
    }
}
