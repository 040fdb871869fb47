//! Trust-boundary enforcement for inbound JSON bodies.
//!
//! Every handler parses its body through [`validate_body`]; nothing past this
//! module ever sees an unvalidated or unnormalized value. Validation is
//! all-or-nothing: either every field passes and a normalized payload comes
//! out, or the whole request is rejected with a field-indexed error list.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Implemented by each endpoint's raw request type. `Output` is the
/// normalized payload handlers actually work with.
pub trait Validate: Sized {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Parse and validate a raw body in one step.
pub fn validate_body<T>(body: &[u8]) -> Result<T::Output, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let raw: T = serde_json::from_slice(body).map_err(|e| {
        ApiError::Validation(vec![FieldError::new("body", format!("Invalid JSON: {}", e))])
    })?;
    raw.validate().map_err(ApiError::Validation)
}

/// Shape check matching `^[^\s@]+@[^\s@]+\.[^\s@]+$`: local part, one `@`,
/// and a dot somewhere in the domain. Not RFC 5321, deliberately.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain needs a dot with something on both sides.
    match domain.rfind('.') {
        Some(i) => i > 0 && i + 1 < domain.len(),
        None => false,
    }
}

/// Required string field: present, non-empty after trimming, within bounds.
pub fn required_text(
    value: Option<String>,
    field: &'static str,
    max_len: usize,
    errors: &mut Vec<FieldError>,
) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => {
            errors.push(FieldError::new(field, format!("{} is required", field)));
            String::new()
        }
        Some(v) if v.len() > max_len => {
            errors.push(FieldError::new(
                field,
                format!("{} must be at most {} characters", field, max_len),
            ));
            String::new()
        }
        Some(v) => v,
        None => {
            errors.push(FieldError::new(field, format!("{} is required", field)));
            String::new()
        }
    }
}

/// Optional string field: trimmed, empty collapses to `None`.
pub fn optional_text(
    value: Option<String>,
    field: &'static str,
    max_len: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => None,
        Some(v) if v.len() > max_len => {
            errors.push(FieldError::new(
                field,
                format!("{} must be at most {} characters", field, max_len),
            ));
            None
        }
        Some(v) => Some(v),
        None => None,
    }
}

/// Required email field, normalized to trimmed lowercase.
pub fn required_email(
    value: Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    let email = match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push(FieldError::new(field, "Valid email address is required"));
            return String::new();
        }
    };
    if !is_valid_email(&email) {
        errors.push(FieldError::new(field, "Valid email address is required"));
        return String::new();
    }
    email
}
