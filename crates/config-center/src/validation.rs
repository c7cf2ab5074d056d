//! 参数校验
//!
//! 长度上限沿用 configs / sync_status 表的 varchar(50) 列宽。

use crate::error::{ConfigCenterError, Result};

pub const MAX_KEY_LEN: usize = 50;

/// update_user 为空时使用的默认写者
pub const DEFAULT_UPDATE_USER: &str = "admin";

/// scope / name / client_id 等标识：去掉首尾空白后非空且不超过 50 个字符
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigCenterError::Validation(format!("{} 不能为空", field)));
    }
    if trimmed.len() != value.len() {
        return Err(ConfigCenterError::Validation(format!(
            "{} 不能包含首尾空白: {:?}",
            field, value
        )));
    }
    if value.chars().count() > MAX_KEY_LEN {
        return Err(ConfigCenterError::Validation(format!(
            "{} 超过 {} 个字符",
            field, MAX_KEY_LEN
        )));
    }
    Ok(())
}

/// 规范化写者标识：空白时回落为 admin
pub fn normalize_update_user(user: &str) -> Result<String> {
    let user = user.trim();
    if user.is_empty() {
        return Ok(DEFAULT_UPDATE_USER.to_string());
    }
    validate_identifier("update_user", user)?;
    Ok(user.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_padded() {
        assert!(validate_identifier("scope", "").unwrap_err().is_validation());
        assert!(validate_identifier("scope", "   ").is_err());
        assert!(validate_identifier("scope", " stock").is_err());
        assert!(validate_identifier("scope", "stock").is_ok());
    }

    #[test]
    fn enforces_length_in_chars() {
        assert!(validate_identifier("name", &"x".repeat(50)).is_ok());
        assert!(validate_identifier("name", &"x".repeat(51)).is_err());
        // 多字节字符按字符数计
        assert!(validate_identifier("name", &"配".repeat(50)).is_ok());
    }

    #[test]
    fn blank_user_defaults_to_admin() {
        assert_eq!(normalize_update_user("  ").unwrap(), "admin");
        assert_eq!(normalize_update_user(" alice ").unwrap(), "alice");
    }
}
