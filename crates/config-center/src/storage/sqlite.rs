//! SQLite 存储后端
//!
//! 单个写连接放在 `tokio::sync::Mutex` 后面，每次后端调用在锁内完成全部语句，
//! 因此单行写入是原子的；读-合并-写的跨调用原子性由上层的更新策略决定。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::error::{ConfigCenterError, Result};
use crate::storage::dao::{DaoFactory, TransactionManager};
use crate::storage::entities::{ConfigRecord, ConfigUpdate, NewConfig, SyncStatus, UpdateOutcome};
use crate::storage::migrate;
use crate::storage::ConfigBackend;
use crate::utils::time::{Clock, SystemClock};

pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
    /// None 表示内存数据库
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").field("path", &self.path).finish()
    }
}

impl SqliteBackend {
    /// 打开（或创建）文件数据库并执行迁移
    pub async fn open(path: &Path) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigCenterError::IO(format!("创建数据库目录失败: {}", e)))?;
        }

        let mut conn = Connection::open(path)
            .map_err(|e| ConfigCenterError::Storage(format!("打开数据库失败: {}", e)))?;
        migrate::init_db(&mut conn)?;

        tracing::info!("SQLite 数据库初始化完成: {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
            path: Some(path.to_path_buf()),
        })
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| ConfigCenterError::Storage(format!("打开内存数据库失败: {}", e)))?;
        migrate::init_db(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 在连接锁内执行同步闭包；闭包内不得 await
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}

#[async_trait]
impl ConfigBackend for SqliteBackend {
    async fn insert_config(&self, new: &NewConfig) -> Result<ConfigRecord> {
        let now = self.clock.now_secs();
        self.with_conn(|conn| {
            TransactionManager::new(conn).execute(|conn| {
                let dao = DaoFactory::config_dao(conn);
                dao.insert(new, now)?;
                dao.get(&new.scope, &new.name)?.ok_or_else(|| {
                    ConfigCenterError::Storage(format!(
                        "插入后读取失败: {}/{}",
                        new.scope, new.name
                    ))
                })
            })
        })
        .await
    }

    async fn update_config(&self, update: &ConfigUpdate) -> Result<UpdateOutcome> {
        let now = self.clock.now_secs();
        self.with_conn(|conn| {
            TransactionManager::new(conn).execute(|conn| {
                let dao = DaoFactory::config_dao(conn);
                if dao.update_values(update, now)? == 0 {
                    return Ok(match dao.current_revision(&update.scope, &update.name)? {
                        Some(current) => UpdateOutcome::RevisionMismatch { current },
                        None => UpdateOutcome::NotFound,
                    });
                }
                match dao.get(&update.scope, &update.name)? {
                    Some(record) => Ok(UpdateOutcome::Updated(record)),
                    None => Ok(UpdateOutcome::NotFound),
                }
            })
        })
        .await
    }

    async fn delete_config(&self, scope: &str, name: &str) -> Result<usize> {
        self.with_conn(|conn| DaoFactory::config_dao(conn).delete(scope, name))
            .await
    }

    async fn get_config(&self, scope: &str, name: &str) -> Result<Option<ConfigRecord>> {
        self.with_conn(|conn| DaoFactory::config_dao(conn).get(scope, name))
            .await
    }

    async fn list_by_scope(&self, scope: &str) -> Result<Vec<ConfigRecord>> {
        self.with_conn(|conn| DaoFactory::config_dao(conn).list_by_scope(scope))
            .await
    }

    async fn list_updated_after(&self, cursor: i64) -> Result<Vec<ConfigRecord>> {
        self.with_conn(|conn| DaoFactory::config_dao(conn).list_updated_after(cursor))
            .await
    }

    async fn load_or_create_sync_status(&self, client_id: &str) -> Result<SyncStatus> {
        self.with_conn(|conn| {
            let dao = DaoFactory::sync_status_dao(conn);
            dao.insert_if_absent(client_id)?;
            dao.get(client_id)?.ok_or_else(|| {
                ConfigCenterError::Storage(format!("创建同步状态后读取失败: {}", client_id))
            })
        })
        .await
    }

    async fn get_sync_status(&self, client_id: &str) -> Result<Option<SyncStatus>> {
        self.with_conn(|conn| DaoFactory::sync_status_dao(conn).get(client_id))
            .await
    }

    async fn save_sync_status(&self, client_id: &str, update_time: i64) -> Result<()> {
        self.with_conn(|conn| DaoFactory::sync_status_dao(conn).upsert(client_id, update_time))
            .await
    }

    async fn list_sync_status(&self) -> Result<Vec<SyncStatus>> {
        self.with_conn(|conn| DaoFactory::sync_status_dao(conn).list())
            .await
    }
}
