//! 日志初始化 - tracing + tracing-subscriber fmt 输出

use tracing::Level;

use crate::error::{ConfigCenterError, Result};

/// 解析日志级别，大小写不敏感，`warning` 视为 `warn`
pub fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ConfigCenterError::Config(format!("无效的日志级别: {}", other))),
    }
}

/// 安装全局 fmt subscriber；已安装过时返回 false 且不报错
pub fn init_logging(level: &str) -> Result<bool> {
    let level = parse_level(level)?;
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!("logger initialized, level={}", level);
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse() {
        assert_eq!(parse_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_level("warning").unwrap(), Level::WARN);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn second_init_is_noop() {
        init_logging("debug").unwrap();
        assert!(!init_logging("info").unwrap());
        assert!(init_logging("nope").is_err());
    }
}
