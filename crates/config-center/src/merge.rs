//! 配置合并 - 部分更新的覆盖规则
//!
//! 规则（字段粒度的 last-write-wins）：
//! - incoming 中的每个键覆盖原值；未出现的键原样保留
//! - changed_value 以同样的规则叠加 incoming，因此它记录的是“所有被写过的字段”
//! - 值被视为不透明的 JSON：不做类型检查，嵌套对象整体替换，不做深合并；
//!   `null` 也是一个普通的值，不会删除键

use crate::error::{ConfigCenterError, Result};
use crate::storage::entities::JsonObject;

/// 合并结果
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub value: JsonObject,
    pub changed_value: JsonObject,
}

/// 把 incoming 的每个键写入 target
pub fn overlay(target: &mut JsonObject, incoming: &JsonObject) {
    for (k, v) in incoming {
        target.insert(k.clone(), v.clone());
    }
}

/// 纯函数合并，不校验 incoming 是否为空
pub fn merge(
    existing_value: &JsonObject,
    existing_changed: &JsonObject,
    incoming: &JsonObject,
) -> MergeOutcome {
    let mut value = existing_value.clone();
    overlay(&mut value, incoming);

    let mut changed_value = existing_changed.clone();
    overlay(&mut changed_value, incoming);

    MergeOutcome {
        value,
        changed_value,
    }
}

/// 部分更新入口：空的 incoming 说明调用方有 bug，直接拒绝
pub fn merge_partial(
    existing_value: &JsonObject,
    existing_changed: &JsonObject,
    incoming: &JsonObject,
) -> Result<MergeOutcome> {
    if incoming.is_empty() {
        return Err(ConfigCenterError::Validation("nothing to update".to_string()));
    }
    Ok(merge(existing_value, existing_changed, incoming))
}
