//! 版本与运行时元信息
//!
//! - **Crate Version** → Cargo.toml（唯一权威源）
//! - **Migration Version** → migrations 文件（文件即版本，由 refinery 自动管理）
//! - **Build Metadata** → vergen 在 build.rs 中生成，缺失时为 `unknown`

/// crate semver，来自 Cargo.toml
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// git commit（非 git 目录构建时为 `unknown`）
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// 构建时间
pub const BUILD_TIME: &str = match option_env!("VERGEN_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

/// 当前支持的最高数据库 migration 版本（refinery_schema_history.version）。
/// 由 build.rs 扫描 migrations/ 自动生成；打开数据库时若 DB 版本更高则拒绝。
pub const DB_VERSION: i64 = parse_db_version(env!("CONFIG_CENTER_DB_VERSION"));

/// 编译期解析版本号字符串（build.rs 只会输出纯数字）
const fn parse_db_version(s: &str) -> i64 {
    let b = s.as_bytes();
    let mut v = 0i64;
    let mut i = 0usize;
    while i < b.len() {
        if b[i] >= b'0' && b[i] <= b'9' {
            v = v * 10 + (b[i] - b'0') as i64;
        }
        i += 1;
    }
    v
}
