// Utility helpers shared by handlers

use crate::error::{AppError, Result};

/// Clamps a requested page size to the configured maximum.
pub fn ensure_page_limit(limit: Option<u32>, default: u32, configured_max: u32) -> Result<u32> {
    let max = configured_max.max(1);
    match limit {
        None => Ok(default.clamp(1, max)),
        Some(0) => Err(AppError::BadRequest("limit must be > 0".to_string())),
        Some(limit) if limit > max => Err(AppError::BadRequest(format!(
            "limit must be <= {}",
            max
        ))),
        Some(limit) => Ok(limit),
    }
}

/// Trims `raw` and checks its length in characters.
pub fn normalize_text(field: &str, raw: &str, min: usize, max: usize) -> Result<String> {
    let value = raw.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::BadRequest(format!(
            "{} must be {}-{} characters",
            field, min, max
        )));
    }
    Ok(value.to_string())
}

/// Like `normalize_text`, but blank input becomes `None`.
pub fn normalize_optional_text(field: &str, raw: Option<&str>, max: usize) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => normalize_text(field, value, 1, max).map(Some),
        None => Ok(None),
    }
}

/// Optional-field update: `None` keeps the stored value, `Some(None)` clears
/// it, `Some(Some(v))` sets it.
pub type TextUpdate<'a> = Option<Option<&'a str>>;

/// Normalizes an update to a clearable text field. An explicit blank string
/// clears the field; a missing one leaves it as is.
pub fn normalize_text_update(field: &str, raw: Option<&str>, max: usize) -> Result<Option<Option<String>>> {
    match raw {
        None => Ok(None),
        Some(value) => normalize_optional_text(field, Some(value), max).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_defaults_and_bounds() {
        assert_eq!(ensure_page_limit(None, 20, 50).unwrap(), 20);
        assert_eq!(ensure_page_limit(None, 80, 50).unwrap(), 50);
        assert_eq!(ensure_page_limit(Some(10), 20, 50).unwrap(), 10);
        assert!(ensure_page_limit(Some(0), 20, 50).is_err());
        assert!(ensure_page_limit(Some(51), 20, 50).is_err());
    }

    #[test]
    fn normalize_text_trims_and_checks_length() {
        assert_eq!(normalize_text("name", "  Backlog ", 1, 10).unwrap(), "Backlog");
        assert!(normalize_text("name", "   ", 1, 10).is_err());
        assert!(normalize_text("name", "abcdefghijk", 1, 10).is_err());
    }

    #[test]
    fn text_update_distinguishes_keep_clear_and_set() {
        assert_eq!(normalize_text_update("bio", None, 10).unwrap(), None);
        assert_eq!(normalize_text_update("bio", Some("   "), 10).unwrap(), Some(None));
        assert_eq!(normalize_text_update("bio", Some(""), 10).unwrap(), Some(None));
        assert_eq!(
            normalize_text_update("bio", Some(" new "), 10).unwrap(),
            Some(Some("new".to_string()))
        );
        assert!(normalize_text_update("bio", Some("far too long here"), 10).is_err());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(normalize_optional_text("bio", Some("  "), 10).unwrap(), None);
        assert_eq!(normalize_optional_text("bio", None, 10).unwrap(), None);
        assert_eq!(
            normalize_optional_text("bio", Some(" hi "), 10).unwrap(),
            Some("hi".to_string())
        );
    }
}
