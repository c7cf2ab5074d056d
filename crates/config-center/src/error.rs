use thiserror::Error;

/// 错误分类，供传输层映射状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Storage,
    Serialization,
    Config,
    IO,
}

#[derive(Debug, Error)]
pub enum ConfigCenterError {
    /// 记录或同步状态不存在
    #[error("Not found: {0}")]
    NotFound(String),
    /// 创建时 (scope, name) 已存在，或 CAS 更新重试耗尽
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 参数校验失败（空 scope/name、空的部分更新等）
    #[error("Validation error: {0}")]
    Validation(String),
    /// 存储层错误，只携带包装后的消息
    #[error("Storage error: {0}")]
    Storage(String),
    /// JSON 编解码失败
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// 配置文件错误
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    IO(String),
}

impl ConfigCenterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigCenterError::NotFound(_) => ErrorKind::NotFound,
            ConfigCenterError::Conflict(_) => ErrorKind::Conflict,
            ConfigCenterError::Validation(_) => ErrorKind::Validation,
            ConfigCenterError::Storage(_) => ErrorKind::Storage,
            ConfigCenterError::Serialization(_) => ErrorKind::Serialization,
            ConfigCenterError::Config(_) => ErrorKind::Config,
            ConfigCenterError::IO(_) => ErrorKind::IO,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigCenterError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ConfigCenterError::Conflict(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ConfigCenterError::Validation(_))
    }
}

impl From<refinery::Error> for ConfigCenterError {
    fn from(error: refinery::Error) -> Self {
        ConfigCenterError::Storage(format!("执行 migration 失败: {}", error))
    }
}

impl From<serde_json::Error> for ConfigCenterError {
    fn from(error: serde_json::Error) -> Self {
        ConfigCenterError::Serialization(error.to_string())
    }
}

impl From<std::io::Error> for ConfigCenterError {
    fn from(error: std::io::Error) -> Self {
        ConfigCenterError::IO(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigCenterError>;
