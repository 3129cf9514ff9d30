//! Device abstraction traits for testability
//!
//! This module defines the trait the upload pipeline talks to, allowing both
//! a real Frame TV and a mock TV to be used interchangeably. This enables
//! testing the whole upload loop without a TV on the network.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use frame_art_uploader::device::traits::{ArtSession, DeviceError};
//!
//! async fn show<S: ArtSession>(tv: &mut S, data: Vec<u8>) -> Result<(), DeviceError> {
//!     if tv.supported().await? {
//!         let content_id = tv.upload(data, "jpg", "none").await?;
//!         tv.select_image(&content_id, true).await?;
//!     }
//!     tv.close().await;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

/// Errors raised by a device session
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device answered a request with an error event
    #[error("{request} failed: {message}")]
    Response { request: String, message: String },

    /// No matching event arrived from the device in time
    #[error("no data received while waiting for {0}")]
    NoData(String),

    /// The user declined the connection on the TV, or the token is stale
    #[error("connection not authorized by the TV")]
    Unauthorized,

    /// The control channel could not be opened or was lost
    #[error("connection error: {0}")]
    Connection(String),

    /// The side-channel upload socket failed
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The REST info endpoint failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// A message from the device could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Whether this is an error answer from the device
    pub fn is_response(&self) -> bool {
        matches!(self, DeviceError::Response { .. })
    }

    /// Whether the device simply never answered
    pub fn is_no_data(&self) -> bool {
        matches!(self, DeviceError::NoData(_))
    }
}

/// Description of the TV returned by its REST info endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Friendly name (e.g., "Living Room Frame")
    pub name: String,
    /// Model name (e.g., "QE55LS03BAUXXU")
    pub model: String,
    /// Whether the TV advertises art mode support
    pub frame_tv_support: bool,
    /// Reported power state, when the firmware exposes it
    pub power_state: Option<String>,
}

/// The artwork currently selected on the TV
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtworkInfo {
    /// Content id of the artwork (e.g., "MY_F0003")
    pub content_id: String,
    /// Landscape matte id, if any
    pub matte_id: Option<String>,
    /// Portrait matte id, if any
    pub portrait_matte_id: Option<String>,
    /// Category the artwork belongs to
    pub category_id: Option<String>,
}

impl Display for ArtworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_id)?;
        if let Some(matte) = &self.matte_id {
            write!(f, " (matte {})", matte)?;
        }
        Ok(())
    }
}

/// A live session with a TV's art channel
///
/// Implementations own their connection and any background listener. The
/// art mode flag is maintained passively from device events, so reading it
/// never performs a round-trip.
#[async_trait]
pub trait ArtSession: Send {
    /// Whether the TV supports art mode at all
    async fn supported(&mut self) -> Result<bool, DeviceError>;

    /// Whether the TV is powered on
    async fn is_on(&mut self) -> Result<bool, DeviceError>;

    /// Last art mode state reported by the TV, `None` until it reports one
    fn art_mode(&self) -> Option<bool>;

    /// The artwork currently selected on the TV
    async fn current_artwork(&mut self) -> Result<ArtworkInfo, DeviceError>;

    /// Upload an image and return the content id the TV assigned to it
    async fn upload(
        &mut self,
        data: Vec<u8>,
        file_type: &str,
        matte: &str,
    ) -> Result<String, DeviceError>;

    /// Apply a photo filter to an uploaded image
    async fn set_photo_filter(&mut self, content_id: &str, filter: &str)
        -> Result<(), DeviceError>;

    /// Select an image as the active artwork, optionally showing it now
    async fn select_image(&mut self, content_id: &str, show: bool) -> Result<(), DeviceError>;

    /// Close the connection and stop listening; later calls do nothing
    async fn close(&mut self);
}
