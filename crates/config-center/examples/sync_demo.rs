//! 增量同步示例
//!
//! 展示部分更新的合并效果，以及两个客户端各自按游标拉取变更

use config_center::{
    scope, utils::time::format_unix_secs, ConfigCenter, ConfigCenterConfig, GlobalConfigPatch,
    StockConfigPatch,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Config Center 增量同步示例 ===\n");

    let config = ConfigCenterConfig::builder()
        .in_memory()
        .log_level("debug")
        .build();
    let center = ConfigCenter::open(config).await?;

    // 1. 创建配置
    let value = StockConfigPatch::default()
        .prod_status(true)
        .pre_status(false)
        .up_limit(9.8)
        .low_limit(-9.8)
        .into_object()?;
    center.create_config(scope::STOCK, "600000", value, "alice").await?;
    let broker = GlobalConfigPatch::default().broker("citic").into_object()?;
    center.create_config(scope::GLOBAL, "trade", broker, "alice").await?;
    println!("1️⃣ 已创建 stock/600000 与 global/trade\n");

    // 2. 客户端首次拉取（全量）
    let first = center.pull_changes("trader-1", 0).await?;
    println!("2️⃣ trader-1 首次拉取 {} 条", first.len());
    for record in &first {
        println!(
            "   {}/{} @ {} value={:?}",
            record.scope,
            record.name,
            format_unix_secs(record.update_time),
            record.value
        );
    }
    println!();

    // 跨过游标所在的秒
    tokio::time::sleep(Duration::from_millis(1100)).await;

    // 3. 部分更新
    let patch = StockConfigPatch::default().up_limit(5.0).into_object()?;
    let updated = center.update_config(scope::STOCK, "600000", &patch, "bob").await?;
    println!("3️⃣ bob 修改 up_limit");
    println!("   value         = {:?}", updated.value);
    println!("   changed_value = {:?}\n", updated.changed_value);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // 4. 增量拉取只包含变更的记录
    let delta = center.pull_changes("trader-1", 0).await?;
    println!("4️⃣ trader-1 增量拉取 {} 条", delta.len());
    let again = center.pull_changes("trader-1", 0).await?;
    println!("   立即再拉取 {} 条", again.len());

    // 5. 另一个客户端有自己的游标
    let other = center.pull_changes("trader-2", 0).await?;
    println!("5️⃣ trader-2 首次拉取 {} 条\n", other.len());

    // 6. 同步状态
    println!("6️⃣ 同步状态:");
    for status in center.get_all_sync_status().await? {
        println!(
            "   {} -> {}",
            status.client_id,
            format_unix_secs(status.update_time)
        );
    }

    Ok(())
}
