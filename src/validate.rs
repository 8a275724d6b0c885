//! Upload validation.
//!
//! The first gate of the pipeline. The cap itself must be a finite, positive
//! number of megabytes; anything else is [`ValidationError::InvalidLimit`]
//! before the file is looked at. A file then passes when:
//!
//! 1. Its MIME type **or** its extension names an accepted format (PNG,
//!    JPG/JPEG, WebP, GIF). Either check alone is enough, so uploads with an
//!    empty MIME type are still accepted by extension.
//! 2. Its size does not exceed `max_size_mb * 1024 * 1024` bytes.
//! 3. It is not empty.
//!
//! Checks run in that order and the first failure is reported. Nothing here
//! touches the payload bytes beyond their length.

use crate::types::UploadedFile;
use serde::Serialize;
use thiserror::Error;

/// Default upload cap in megabytes.
pub const DEFAULT_MAX_SIZE_MB: f64 = 10.0;

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
];

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Upload size limit must be a positive number of megabytes, got {max_size_mb}")]
    InvalidLimit { max_size_mb: f64 },
    #[error("Invalid file type. Please upload a PNG, JPG, WebP, or GIF image")]
    InvalidType,
    #[error("File size exceeds the {max_size_mb}MB limit")]
    TooLarge { size: u64, max_size_mb: f64 },
    #[error("File is empty")]
    Empty,
}

/// Outcome of [`validate`], shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether a file extension (without the dot) names an accepted format.
pub fn is_supported_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

fn is_supported_mime(mime: &str) -> bool {
    let mime = mime.trim();
    !mime.is_empty()
        && ALLOWED_MIME_TYPES
            .iter()
            .any(|allowed| mime.eq_ignore_ascii_case(allowed))
}

/// Run every check and return the first failure.
pub fn check(file: &UploadedFile, max_size_mb: f64) -> Result<(), ValidationError> {
    if !(max_size_mb.is_finite() && max_size_mb > 0.0) {
        return Err(ValidationError::InvalidLimit { max_size_mb });
    }

    let type_ok = is_supported_mime(&file.mime_type)
        || file.extension().is_some_and(|ext| is_supported_extension(&ext));
    if !type_ok {
        return Err(ValidationError::InvalidType);
    }

    let max_bytes = max_size_mb * 1024.0 * 1024.0;
    if file.size() as f64 > max_bytes {
        return Err(ValidationError::TooLarge {
            size: file.size(),
            max_size_mb,
        });
    }

    if file.size() == 0 {
        return Err(ValidationError::Empty);
    }

    Ok(())
}

/// Validate an upload against `max_size_mb`.
pub fn validate(file: &UploadedFile, max_size_mb: f64) -> ValidationResult {
    match check(file, max_size_mb) {
        Ok(()) => ValidationResult {
            is_valid: true,
            error: None,
        },
        Err(e) => ValidationResult {
            is_valid: false,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> UploadedFile {
        UploadedFile::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn accepts_png_by_mime() {
        let result = validate(&file("banner.png", "image/png", 1024), DEFAULT_MAX_SIZE_MB);
        assert!(result.is_valid);
        assert_eq!(result.error, None);
    }

    #[test]
    fn accepts_by_extension_when_mime_is_empty() {
        let result = validate(&file("banner.png", "", 1024), DEFAULT_MAX_SIZE_MB);
        assert!(result.is_valid);
    }

    #[test]
    fn accepts_by_mime_when_extension_is_missing() {
        let result = validate(&file("clipboard", "image/webp", 10), DEFAULT_MAX_SIZE_MB);
        assert!(result.is_valid);
    }

    #[test]
    fn mime_and_extension_are_case_insensitive() {
        assert!(validate(&file("A.JPEG", "", 10), DEFAULT_MAX_SIZE_MB).is_valid);
        assert!(validate(&file("a", "IMAGE/GIF", 10), DEFAULT_MAX_SIZE_MB).is_valid);
    }

    #[test]
    fn rejects_pdf() {
        let result = validate(
            &file("brief.pdf", "application/pdf", 1024),
            DEFAULT_MAX_SIZE_MB,
        );
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("Invalid file type"));
    }

    #[test]
    fn rejects_oversized_png() {
        let result = validate(
            &file("big.png", "image/png", 11 * 1024 * 1024),
            DEFAULT_MAX_SIZE_MB,
        );
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("exceeds"));
    }

    #[test]
    fn accepts_exactly_the_limit() {
        let result = validate(&file("edge.png", "image/png", 1024 * 1024), 1.0);
        assert!(result.is_valid);
    }

    #[test]
    fn rejects_empty_file() {
        let result = validate(&file("empty.png", "image/png", 0), DEFAULT_MAX_SIZE_MB);
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("empty"));
    }

    #[test]
    fn type_check_runs_before_emptiness() {
        assert_eq!(
            check(&file("empty.pdf", "application/pdf", 0), DEFAULT_MAX_SIZE_MB),
            Err(ValidationError::InvalidType)
        );
    }

    #[test]
    fn unusable_limit_is_rejected() {
        let f = file("banner.png", "image/png", 1024);
        for limit in [f64::NAN, 0.0, -1.0, f64::INFINITY] {
            assert!(matches!(
                check(&f, limit),
                Err(ValidationError::InvalidLimit { .. })
            ));
        }
        let result = validate(&f, f64::NAN);
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("size limit"));
    }

    #[test]
    fn validate_is_repeatable() {
        let f = file("big.png", "image/png", 2 * 1024 * 1024);
        assert_eq!(validate(&f, 1.0), validate(&f, 1.0));
    }
}
