//! Pre-flight checks for values that end up as URL path segments

use crate::error::AppError;

/// Reject values that would change the shape of the request URL.
///
/// Values are still percent-encoded when the URL is built; this only catches
/// input that is obviously wrong before any token is requested.
pub fn validate_segment(label: &str, value: &str) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{label} must not be empty")));
    }
    if trimmed.len() != value.len() {
        return Err(AppError::InvalidInput(format!(
            "{label} must not have leading or trailing whitespace"
        )));
    }
    if let Some(c) = value.chars().find(|c| matches!(c, '/' | '?' | '#' | '\\')) {
        return Err(AppError::InvalidInput(format!(
            "{label} must not contain '{c}': {value}"
        )));
    }
    Ok(())
}
