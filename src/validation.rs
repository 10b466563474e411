//! Request field checks. Every failure names the offending field.

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("field '{}' is required", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

pub fn optional_text(field: &str, value: Option<&str>, max_len: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max_len => Err(ApiError::BadRequest(format!(
            "field '{}' must be at most {} characters",
            field, max_len
        ))),
        _ => Ok(()),
    }
}

/// Loose shape check: one '@', non-empty local part, dotted domain.
pub fn validate_email(field: &str, value: &str) -> Result<(), ApiError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be a valid email address",
            field
        )));
    }
    require_text(field, value, 100)
}

pub fn validate_password(field: &str, value: &str) -> Result<(), ApiError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be at least {} characters",
            field, MIN_PASSWORD_LEN
        )));
    }
    // bcrypt ignores everything past this, so longer inputs would collide.
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be at most {} bytes",
            field, MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be a non-negative number",
            field
        )));
    }
    Ok(())
}

pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ApiError> {
    if !allowed.contains(&value) {
        return Err(ApiError::BadRequest(format!(
            "field '{}' must be one of: {}",
            field,
            allowed.join(", ")
        )));
    }
    Ok(())
}

/// Emails are compared case-insensitively everywhere.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
