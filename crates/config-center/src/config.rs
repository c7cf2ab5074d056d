//! 配置中心自身的运行配置
//!
//! 支持从 JSON 文件读取（缺省字段取默认值），也可以用 builder 构造。
//!
//! ```json
//! {
//!   "log": { "level": "debug" },
//!   "database": { "path": "/var/lib/config_center/config_center.db" },
//!   "update_strategy": "compare_and_set",
//!   "max_update_retries": 5
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigCenterError, Result};
use crate::logging::parse_level;

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "config_center.db";

/// 部分更新的写回策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// 读取 → 合并 → 写回；并发写同一记录时后写者覆盖先写者
    #[default]
    ReadModifyWrite,
    /// 写回时比对读取到的 revision，不一致则重新读取合并，超过重试次数返回 Conflict
    CompareAndSet,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace / debug / info / warn / error
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库文件路径；None 时为 {data_dir}/config_center.db
    pub path: Option<PathBuf>,
    /// 使用内存数据库（进程退出即丢失）
    pub in_memory: bool,
}

/// 配置中心配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigCenterConfig {
    /// 数据存储目录
    pub data_dir: PathBuf,
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub update_strategy: UpdateStrategy,
    /// CompareAndSet 下的最大重试次数
    pub max_update_retries: u32,
}

impl Default for ConfigCenterConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            update_strategy: UpdateStrategy::default(),
            max_update_retries: 3,
        }
    }
}

/// 获取默认数据目录 ~/.config_center/
fn default_data_dir() -> PathBuf {
    if let Some(home_dir) = std::env::var("HOME").ok().map(PathBuf::from) {
        home_dir.join(".config_center")
    } else if let Some(home_dir) = std::env::var("USERPROFILE").ok().map(PathBuf::from) {
        home_dir.join(".config_center")
    } else {
        PathBuf::from("./config_center_data")
    }
}

impl ConfigCenterConfig {
    pub fn builder() -> ConfigCenterConfigBuilder {
        ConfigCenterConfigBuilder::new()
    }

    /// 从 JSON 文件读取并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigCenterError::Config(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ConfigCenterError::Config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_level(&self.log.level)?;

        if !self.database.in_memory
            && self.database.path.is_none()
            && self.data_dir.as_os_str().is_empty()
        {
            return Err(ConfigCenterError::Config("数据目录不能为空".to_string()));
        }

        if self.update_strategy == UpdateStrategy::CompareAndSet && self.max_update_retries == 0 {
            return Err(ConfigCenterError::Config(
                "compare_and_set 至少需要 1 次重试".to_string(),
            ));
        }

        Ok(())
    }

    /// 文件数据库路径；内存模式返回 None
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.database.in_memory {
            return None;
        }
        Some(
            self.database
                .path
                .clone()
                .unwrap_or_else(|| self.data_dir.join(DEFAULT_DB_FILE)),
        )
    }
}

/// 配置构建器
pub struct ConfigCenterConfigBuilder {
    config: ConfigCenterConfig,
}

impl Default for ConfigCenterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCenterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigCenterConfig::default(),
        }
    }

    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.database.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.config.database.in_memory = true;
        self
    }

    pub fn log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.log.level = level.into();
        self
    }

    pub fn update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.config.update_strategy = strategy;
        self
    }

    pub fn max_update_retries(mut self, retries: u32) -> Self {
        self.config.max_update_retries = retries;
        self
    }

    pub fn build(self) -> ConfigCenterConfig {
        self.config
    }
}
