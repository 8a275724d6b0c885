//! Image metadata extraction.
//!
//! Turns an [`UploadedFile`] into an [`ImageMetadata`]: pixel dimensions,
//! byte size, a normalized format token, and a display size string.
//!
//! ## Decoding
//!
//! Dimensions come from the [`ImageBackend`], which only reads the container
//! header. The probe runs on tokio's blocking pool; the payload is shared by
//! reference count and the decoder's cursor lives inside the blocking closure,
//! so nothing outlives the call on either the success or the failure path.
//!
//! ## Format token
//!
//! Resolved in priority order:
//!
//! - MIME subtype (`image/png` → `PNG`)
//! - filename extension (`banner.webp` → `WEBP`)
//! - literal `UNKNOWN`
//!
//! The token is uppercased and `JPEG` is canonicalized to `JPG`.
//!
//! ## Size strings
//!
//! Two formatters exist and are deliberately not merged:
//!
//! - [`format_byte_size_two_ladder`] (`Bytes` → one-decimal `KB` → one-decimal
//!   `MB`) fills `ImageMetadata::file_size_formatted`.
//! - [`format_byte_size_four_ladder`] (`Bytes`/`KB`/`MB`/`GB`, up to two
//!   decimals) is used by the CLI report for campaign data-transfer volumes,
//!   which routinely reach gigabytes.

use crate::imaging::{BackendError, ImageBackend, RustBackend};
use crate::types::{ImageMetadata, UploadedFile};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode {file_name}: {source}")]
    Backend {
        file_name: String,
        #[source]
        source: BackendError,
    },
    #[error("{file_name} reports invalid dimensions {width}x{height}")]
    InvalidDimensions {
        file_name: String,
        width: u32,
        height: u32,
    },
    #[error("Decode task for {file_name} did not complete: {reason}")]
    Aborted { file_name: String, reason: String },
}

/// Extract metadata using the production [`RustBackend`].
pub async fn extract(file: &UploadedFile) -> Result<ImageMetadata, DecodeError> {
    extract_with(Arc::new(RustBackend::new()), file).await
}

/// Extract metadata with an explicit backend.
pub async fn extract_with(
    backend: Arc<dyn ImageBackend>,
    file: &UploadedFile,
) -> Result<ImageMetadata, DecodeError> {
    let data = Arc::clone(&file.data);
    let probed = tokio::task::spawn_blocking(move || backend.identify(&data))
        .await
        .map_err(|e| DecodeError::Aborted {
            file_name: file.file_name.clone(),
            reason: e.to_string(),
        })?;
    let dims = probed.map_err(|source| DecodeError::Backend {
        file_name: file.file_name.clone(),
        source,
    })?;

    if dims.width == 0 || dims.height == 0 {
        return Err(DecodeError::InvalidDimensions {
            file_name: file.file_name.clone(),
            width: dims.width,
            height: dims.height,
        });
    }

    Ok(ImageMetadata {
        width: dims.width,
        height: dims.height,
        resolution: format!("{}x{}", dims.width, dims.height),
        file_size: file.size(),
        file_size_formatted: format_byte_size_two_ladder(file.size()),
        format: normalize_format(&file.mime_type, &file.file_name),
        file_name: file.file_name.clone(),
    })
}

/// Derive the uppercase format token from a MIME type and file name.
pub fn normalize_format(mime_type: &str, file_name: &str) -> String {
    let from_mime = mime_type
        .split_once('/')
        .map(|(_, subtype)| subtype.trim())
        .filter(|s| !s.is_empty());
    let from_ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty());

    let token = from_mime
        .or(from_ext)
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "UNKNOWN".to_string());

    if token == "JPEG" {
        "JPG".to_string()
    } else {
        token
    }
}

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// `Bytes` below 1 KiB, then one-decimal `KB`, then one-decimal `MB`.
///
/// ```text
/// 512       → "512 Bytes"
/// 1536      → "1.5 KB"
/// 2_500_000 → "2.4 MB"
/// ```
pub fn format_byte_size_two_ladder(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} Bytes")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// `Bytes`/`KB`/`MB`/`GB` with at most two decimals, trailing zeros dropped.
///
/// ```text
/// 0             → "0 Bytes"
/// 1024          → "1 KB"
/// 1_572_864     → "1.5 MB"
/// 2_400_000_000 → "2.24 GB"
/// ```
pub fn format_byte_size_four_ladder(bytes: u64) -> String {
    let b = bytes as f64;
    let (value, unit) = if b < KB {
        return format!("{bytes} Bytes");
    } else if b < MB {
        (b / KB, "KB")
    } else if b < GB {
        (b / MB, "MB")
    } else {
        (b / GB, "GB")
    };
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {unit}")
}
