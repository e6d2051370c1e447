//! Validation for project, prompt and tag names.
//!
//! Names become storage key segments, so they are restricted to a portable
//! character set. Tag names are further kept disjoint from numeric and
//! `latest` references.

use crate::error::{PromptvError, Result};

pub const MAX_NAME_BYTES: usize = 128;

/// The reference that always selects the highest committed version.
pub const LATEST: &str = "latest";

/// Whether `value` is usable as a key segment: starts with an ASCII
/// alphanumeric and contains only alphanumerics, `-`, `_` and `.`.
pub fn is_key_safe(value: &str) -> bool {
    if value.is_empty() || value.len() > MAX_NAME_BYTES {
        return false;
    }
    let mut chars = value.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

pub fn validate_project(project: &str) -> Result<()> {
    if is_key_safe(project) {
        Ok(())
    } else {
        Err(PromptvError::InvalidReference(format!(
            "Invalid project name '{}'",
            project
        )))
    }
}

pub fn validate_prompt(name: &str) -> Result<()> {
    if is_key_safe(name) {
        Ok(())
    } else {
        Err(PromptvError::InvalidReference(format!(
            "Invalid prompt name '{}'",
            name
        )))
    }
}

/// Whether `value` is written like an integer (optional sign, then digits),
/// regardless of whether it fits any integer type.
pub fn looks_like_number(value: &str) -> bool {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Tag names follow the key rules and may not look like a version number or
/// `latest`.
pub fn is_valid_tag_name(tag: &str) -> bool {
    is_key_safe(tag) && tag != LATEST && !looks_like_number(tag)
}

pub fn validate_tag(tag: &str) -> Result<()> {
    if is_valid_tag_name(tag) {
        Ok(())
    } else {
        Err(PromptvError::InvalidReference(format!(
            "Invalid tag name '{}': use letters, digits, '-', '_' or '.', e.g. 'prod', 'v1.0.0', 'staging-v2'",
            tag
        )))
    }
}
