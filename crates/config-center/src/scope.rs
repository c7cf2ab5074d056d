//! 常用 scope 与强类型配置载荷

use serde::{Deserialize, Serialize};

use crate::error::{ConfigCenterError, Result};
use crate::storage::entities::JsonObject;

/// 个股配置，name 为股票代码
pub const STOCK: &str = "stock";
/// 全局配置
pub const GLOBAL: &str = "global";

/// 个股配置载荷
///
/// 未设置的字段在序列化时省略，因此同一个结构既可作为创建时的初始值，
/// 也可作为只包含部分字段的更新。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_limit: Option<f64>,
}

impl StockConfigPatch {
    pub fn prod_status(mut self, on: bool) -> Self {
        self.prod_status = Some(on);
        self
    }

    pub fn pre_status(mut self, on: bool) -> Self {
        self.pre_status = Some(on);
        self
    }

    pub fn up_limit(mut self, limit: f64) -> Self {
        self.up_limit = Some(limit);
        self
    }

    pub fn low_limit(mut self, limit: f64) -> Self {
        self.low_limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 转成 JSON 对象（NaN / 无穷大按 serde_json 的规则写成 null）
    pub fn into_object(self) -> Result<JsonObject> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(ConfigCenterError::Serialization(format!(
                "个股配置不是 JSON 对象: {}",
                other
            ))),
        }
    }
}

/// 全局配置载荷，name 为配置名（如交易通道）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
}

impl GlobalConfigPatch {
    pub fn broker<S: Into<String>>(mut self, broker: S) -> Self {
        self.broker = Some(broker.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn into_object(self) -> Result<JsonObject> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(ConfigCenterError::Serialization(format!(
                "全局配置不是 JSON 对象: {}",
                other
            ))),
        }
    }
}
