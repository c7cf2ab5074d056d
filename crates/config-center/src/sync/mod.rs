//! 增量同步模块
//!
//! 职责：
//! - 维护每个客户端的同步游标（最后确认的 update_time）
//! - 按游标拉取之后变更的配置记录
//! - 交付之后推进游标
//!
//! 游标推进到拉取时刻的 "now"，而不是本批记录的最大 update_time。
//! 在查询和推进之间、且落在同一秒内写入的记录，要到下一次带 override
//! 的拉取才会被看到。

pub mod cursor_store;
pub mod engine;

pub use cursor_store::SyncCursorTracker;
pub use engine::{ConfigSyncService, PullBatch};
