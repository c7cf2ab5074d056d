//! 时间处理工具模块
//!
//! # 设计原则
//!
//! - **存储层**: `create_time` / `update_time` / 同步游标统一使用 UTC Unix 秒（INTEGER）
//! - **时钟注入**: 存储和同步服务通过 [`Clock`] 取当前时间，测试可用 [`ManualClock`] 精确控制

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{TimeZone, Utc};

/// 时间源
pub trait Clock: Send + Sync {
    /// 当前 UTC Unix 秒
    fn now_secs(&self) -> i64;
}

/// 系统墙钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// 手动推进的时钟
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(secs: i64) -> Self {
        Self { secs: AtomicI64::new(secs) }
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// 前进 `delta` 秒，返回新时间
    pub fn advance(&self, delta: i64) -> i64 {
        self.secs.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

/// 格式化为 "YYYY-MM-DD HH:MM:SS"（UTC），用于日志
pub fn format_unix_secs(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_secs(), 100);
        assert_eq!(clock.advance(5), 105);
        clock.set(7);
        assert_eq!(clock.now_secs(), 7);
    }

    #[test]
    fn format_epoch() {
        assert_eq!(format_unix_secs(0), "1970-01-01 00:00:00");
        assert_eq!(format_unix_secs(1_700_000_000), "2023-11-14 22:13:20");
    }
}
