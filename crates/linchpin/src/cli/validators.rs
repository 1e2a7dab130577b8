//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at
//! parse time with a specific message.

use crate::id_generation::EDGE_ID_PREFIX;

/// Maximum work item id length
pub const MAX_ITEM_ID_LENGTH: usize = 128;

/// Maximum title length
pub const MAX_TITLE_LENGTH: usize = 200;

/// Validate a work item id: non-empty, no whitespace, at most 128 characters.
pub fn validate_item_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Work item ID cannot be empty".to_string());
    }
    if s.chars().count() > MAX_ITEM_ID_LENGTH {
        return Err(format!(
            "Work item ID cannot exceed {MAX_ITEM_ID_LENGTH} characters"
        ));
    }
    if s.chars().any(char::is_whitespace) {
        return Err(format!("Work item ID cannot contain whitespace: '{s}'"));
    }
    Ok(s.to_string())
}

/// Validate an edge id of the form `dep-<base36>`.
pub fn validate_edge_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    let Some(hash) = s
        .strip_prefix(EDGE_ID_PREFIX)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return Err(format!(
            "Invalid dependency ID: '{s}'. Expected format: {EDGE_ID_PREFIX}-<id> (e.g., {EDGE_ID_PREFIX}-a3f8)"
        ));
    };
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!(
            "Invalid dependency ID: '{s}'. The part after '{EDGE_ID_PREFIX}-' must be alphanumeric"
        ));
    }
    Ok(s.to_string())
}

/// Validate a work item title.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if s.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("Title cannot exceed {MAX_TITLE_LENGTH} characters"));
    }
    Ok(s.to_string())
}
