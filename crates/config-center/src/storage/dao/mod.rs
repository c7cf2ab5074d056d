//! 数据访问层 (DAO) - 每张表一个专门的操作模块

pub mod config_dao;
pub mod sync_status_dao;

pub use config_dao::ConfigDao;
pub use sync_status_dao::SyncStatusDao;

use rusqlite::Connection;

use crate::error::{ConfigCenterError, Result};

/// 把驱动错误包装成带操作上下文的 Storage 错误
pub(crate) fn db_error(context: &str, error: rusqlite::Error) -> ConfigCenterError {
    ConfigCenterError::Storage(format!("{}失败: {}", context, error))
}

/// DAO 工厂 - 统一创建各种 DAO 实例
pub struct DaoFactory;

impl DaoFactory {
    pub fn config_dao(conn: &Connection) -> ConfigDao<'_> {
        ConfigDao::new(conn)
    }

    pub fn sync_status_dao(conn: &Connection) -> SyncStatusDao<'_> {
        SyncStatusDao::new(conn)
    }
}

/// 事务管理器 - 多条语句组成的操作在同一事务内完成
pub struct TransactionManager<'a> {
    conn: &'a Connection,
}

impl<'a> TransactionManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 执行事务操作；闭包返回错误时事务随 drop 回滚
    pub fn execute<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| ConfigCenterError::Storage(format!("开始事务失败: {}", e)))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| ConfigCenterError::Storage(format!("提交事务失败: {}", e)))?;

        Ok(result)
    }
}
