//! Test Database Module
//!
//! Tools for testing the uploader without a Frame TV on the network.
//!
//! # Features
//!
//! - **Mock TV**: An in-memory [`ArtSession`](crate::device::ArtSession) that
//!   records every call and can fail on demand
//! - **Data Generators**: Small valid PNG and JPEG files written to disk
//! - **Integration Tests**: The full upload workflow against real folders
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use frame_art_uploader::core::uploader::{UploadJobConfig, Uploader};
//! use frame_art_uploader::core::config::UploadConfig;
//! use frame_art_uploader::testdb::{MockFrameTv, MockTvConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let tv = MockFrameTv::with_config(MockTvConfig {
//!     fail_uploads: vec![2],
//!     ..Default::default()
//! });
//! let probe = tv.clone();
//!
//! let uploader = Uploader::new(UploadJobConfig::from_config(&UploadConfig::default()));
//! uploader.run(|| async move { Ok(tv) }).await?;
//! println!("{} uploads attempted", probe.upload_count());
//! # Ok(())
//! # }
//! ```

pub mod generator;
pub mod mock_tv;

#[cfg(test)]
mod integration;

// Re-export commonly used types for convenience
pub use generator::{file_names, with_exif_orientation, write_test_photo, write_text_file};
pub use mock_tv::{MockCall, MockFailure, MockFrameTv, MockTvConfig};
