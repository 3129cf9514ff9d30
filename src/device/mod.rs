//! Device interaction module
//!
//! This module provides functionality for talking to a Samsung Frame TV over
//! its art app channel.
//!
//! # Submodules
//!
//! - `traits` - Abstraction trait for testability
//! - `samsung` - WebSocket session with the TV's art app
//! - `messages` - Art channel wire messages
//! - `rest` - REST info endpoint
//! - `transfer` - Side-channel socket used for image uploads
//! - `tls` - TLS setup for the TV's self-signed certificate
//!
//! # Architecture
//!
//! The upload pipeline only sees [`ArtSession`]. Both the real
//! [`SamsungArtSession`] and the mock TV in `testdb` implement it, allowing
//! the pipeline to work with either.

pub mod messages;
pub mod rest;
pub mod samsung;
pub mod tls;
pub mod traits;
pub mod transfer;

// Re-export commonly used types for convenience
pub use samsung::{SamsungArtSession, SessionOptions};
pub use traits::{ArtSession, ArtworkInfo, DeviceError, DeviceInfo};
