#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`IoError`] variants for file access and encoding/decoding failures.
pub mod error;

/// High-level image reading and writing functions.
///
/// See [`functional::read_image_any`] for automatic format detection and
/// [`functional::write_image`] for extension based encoding.
pub mod functional;

/// PNG image encoding.
pub mod png;

/// TIFF image encoding.
pub mod tiff;

pub use crate::error::IoError;
pub use crate::functional::{read_image_any, write_image, AnyImage};
