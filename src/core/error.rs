//! Error types for the frame art uploader
//!
//! This module defines the error raised while preparing and uploading a
//! single photo. Device-level failures are wrapped from [`DeviceError`].

use crate::device::traits::DeviceError;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised while processing one photo
#[derive(Error, Debug)]
pub enum UploadError {
    /// General I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image could not be decoded, transformed, or re-encoded
    #[error("Image error for '{}': {message}", path.display())]
    ImageError { path: PathBuf, message: String },

    /// File name has no usable extension for the device
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The device rejected or failed a request
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Moving a processed photo to the uploaded folder failed
    #[error("Failed to move '{}' to '{}': {message}", from.display(), to.display())]
    MoveError {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

impl UploadError {
    /// Build an image error from anything displayable
    pub fn image(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        UploadError::ImageError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
