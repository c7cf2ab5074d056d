//! Config Center - 带作用域的键值配置中心
//!
//! 本库提供：
//! - 按 (scope, name) 存储的 JSON 配置，支持部分更新
//! - 每条记录同时维护生效值 `value` 与累计改动 `changed_value`
//! - 基于 update_time 游标的多客户端增量同步
//! - SQLite 持久化（refinery 迁移）与进程内后端
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use config_center::{ConfigCenter, ConfigCenterConfig, StockConfigPatch, scope};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigCenterConfig::builder()
//!         .data_dir("/path/to/data")
//!         .log_level("info")
//!         .build();
//!
//!     let center = ConfigCenter::open(config).await?;
//!
//!     // 创建个股配置
//!     let value = StockConfigPatch::default().prod_status(true).up_limit(9.8).into_object()?;
//!     center.create_config(scope::STOCK, "600000", value, "alice").await?;
//!
//!     // 只改一个字段
//!     let patch = StockConfigPatch::default().up_limit(10.0).into_object()?;
//!     center.update_config(scope::STOCK, "600000", &patch, "bob").await?;
//!
//!     // 客户端拉取自上次以来的变更
//!     for record in center.pull_changes("trader-1", 0).await? {
//!         println!("{}/{} -> {:?}", record.scope, record.name, record.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod center;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod scope;
pub mod storage;
pub mod store;
pub mod sync;
pub mod utils;
pub mod validation;
pub mod version;

pub use center::ConfigCenter;
pub use config::{ConfigCenterConfig, ConfigCenterConfigBuilder, UpdateStrategy};
pub use error::{ConfigCenterError, ErrorKind, Result};
pub use merge::{merge, merge_partial, MergeOutcome};
pub use scope::{GlobalConfigPatch, StockConfigPatch};
pub use storage::{
    ConfigBackend, ConfigRecord, JsonObject, MemoryBackend, SqliteBackend, SyncStatus,
};
pub use store::ConfigStore;
pub use sync::{ConfigSyncService, PullBatch, SyncCursorTracker};
pub use utils::time::{Clock, ManualClock, SystemClock};
