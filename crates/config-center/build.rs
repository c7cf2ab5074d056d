//! 编译期生成 GIT_SHA、BUILD_TIMESTAMP 等元信息（供 version.rs 使用）
//! 以及 CONFIG_CENTER_DB_VERSION（扫描 migrations/ 下 V{version}__*.sql 取最大版本号）

use std::env;
use std::fs;
use std::path::Path;
use vergen::EmitBuilder;

fn main() {
    // 非 git 目录下构建时 vergen 会失败，version.rs 对缺失的变量有兜底
    let _ = EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit();

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR");
    let migrations_dir = Path::new(&manifest_dir).join("migrations");
    let mut max_version: i64 = 0;
    if let Ok(entries) = fs::read_dir(&migrations_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(s) = name.to_str() else { continue };
            // refinery 格式: V{version}__{name}.sql
            let Some(rest) = s.strip_prefix('V').and_then(|r| r.strip_suffix(".sql")) else {
                continue;
            };
            if let Some(Ok(v)) = rest.split("__").next().map(str::parse::<i64>) {
                max_version = max_version.max(v);
            }
        }
    }
    println!("cargo:rustc-env=CONFIG_CENTER_DB_VERSION={}", max_version);
    println!("cargo:rerun-if-changed=migrations/");
}
