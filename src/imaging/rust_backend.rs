//! Pure Rust probing backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `ImageReader::with_guessed_format` (magic bytes) |
//! | Dimensions | `ImageReader::into_dimensions` (header only, no pixel decode) |
//!
//! Only the decoders for the formats the validator accepts are compiled in:
//! PNG, JPEG, WebP and GIF.

use super::backend::{BackendError, Dimensions, ImageBackend};
use image::ImageReader;
use std::io::Cursor;

/// Probing backend using the `image` crate's header readers.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(BackendError::Io)?;
        if reader.format().is_none() {
            return Err(BackendError::ProcessingFailed(
                "Unrecognized image format".to_string(),
            ));
        }
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
        })?;
        Ok(Dimensions { width, height })
    }
}
