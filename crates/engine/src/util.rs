//! Internal helpers for input normalization.
//!
//! These utilities are **not** part of the public API. They keep name and
//! email validation identical across every operation that accepts them.

use crate::{EngineError, ResultEngine};

/// Trim a required name; empty names are rejected with a labeled error.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text; blank input becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Apply a patch to optional free text: `None` keeps the current value, a
/// blank patch clears it.
pub(crate) fn apply_optional_text_patch(
    current: Option<String>,
    patch: Option<&str>,
) -> Option<String> {
    match patch {
        Some(value) => normalize_optional_text(Some(value)),
        None => current,
    }
}

/// Emails are compared case-insensitively, so they are stored lowercase.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(EngineError::InvalidInput(format!("invalid email: {value}")));
    }
    Ok(email)
}
