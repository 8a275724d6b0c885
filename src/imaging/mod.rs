//! Image probing in pure Rust, header reads only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait, [`Dimensions`], [`BackendError`]
//! - **Rust backend**: [`RustBackend`], the production implementation

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use rust_backend::RustBackend;
