//! Frame Art Uploader Library
//!
//! Uploads photos from a local folder to the art gallery of a Samsung Frame
//! TV, so they can be shown in art mode.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`core`] - Configuration, error handling, photo preparation and the
//!   upload workflow
//! - [`device`] - Talking to the TV over its art app channel
//! - [`cli`] - Command-line interface (only used by the binary)
//! - [`testdb`] - Mock TV and test photo generators for testing
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use frame_art_uploader::core::config::Config;
//! use frame_art_uploader::core::uploader::{RunOutcome, UploadJobConfig, Uploader};
//! use frame_art_uploader::device::{SamsungArtSession, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load_default()?;
//!     let options = SessionOptions::from_config(&config.tv)?;
//!
//!     // The session is only opened if the source folder exists
//!     let uploader = Uploader::new(UploadJobConfig::from_config(&config.upload));
//!     match uploader.run(|| SamsungArtSession::connect(options)).await? {
//!         RunOutcome::MissingSourceDir(path) => println!("{} is missing", path.display()),
//!         RunOutcome::Finished(outcome) => println!("{:?}", outcome),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing Without a TV
//!
//! The `testdb` module provides a mock [`ArtSession`](device::ArtSession)
//! that records every call and can fail on demand.

pub mod cli;
pub mod core;
pub mod device;
pub mod testdb;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
