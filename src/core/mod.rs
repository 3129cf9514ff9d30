//! Core functionality module
//!
//! This module contains the core business logic of the frame art uploader,
//! including configuration management, error handling, photo preparation,
//! and the upload workflow.
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `scan` - Finding candidate photos in the source folder
//! - `prepare` - Renaming, orienting and resizing photos
//! - `uploader` - The upload workflow

pub mod config;
pub mod error;
pub mod prepare;
pub mod scan;
pub mod uploader;
