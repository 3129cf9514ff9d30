//! Mock Frame TV for testing without a real device
//!
//! [`MockFrameTv`] implements [`ArtSession`] entirely in memory. Every call
//! is recorded so tests can assert on what the upload pipeline did, and
//! failures can be injected per call.

use crate::device::traits::{ArtSession, ArtworkInfo, DeviceError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call made against the mock TV
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Supported,
    IsOn,
    CurrentArtwork,
    Upload {
        file_type: String,
        matte: String,
        size: usize,
    },
    SetPhotoFilter {
        content_id: String,
        filter: String,
    },
    SelectImage {
        content_id: String,
        show: bool,
    },
    Close,
}

/// Kind of failure to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// The TV answers with an error event
    Response,
    /// The TV never answers
    NoData,
    /// The connection drops
    Connection,
}

impl MockFailure {
    fn to_error(self, request: &str) -> DeviceError {
        match self {
            MockFailure::Response => DeviceError::Response {
                request: request.to_string(),
                message: "error code -1".to_string(),
            },
            MockFailure::NoData => DeviceError::NoData(request.to_string()),
            MockFailure::Connection => {
                DeviceError::Connection("simulated disconnect".to_string())
            }
        }
    }
}

/// Configuration for mock TV behavior
#[derive(Debug, Clone)]
pub struct MockTvConfig {
    /// Whether the TV reports art mode support
    pub supported: bool,
    /// Reported power state
    pub power_on: bool,
    /// Passive art mode flag
    pub art_mode: Option<bool>,
    /// Content id reported as currently selected
    pub current_content_id: String,
    /// Fail the status queries
    pub status_failure: Option<MockFailure>,
    /// Fail these upload calls (1-based call numbers)
    pub fail_uploads: Vec<usize>,
    /// Fail these select calls (1-based call numbers)
    pub fail_selects: Vec<usize>,
}

impl Default for MockTvConfig {
    fn default() -> Self {
        Self {
            supported: true,
            power_on: true,
            art_mode: Some(true),
            current_content_id: "SAM-S0700".to_string(),
            status_failure: None,
            fail_uploads: Vec::new(),
            fail_selects: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MockTvState {
    calls: Vec<MockCall>,
    uploads: usize,
    selects: usize,
    next_content_id: usize,
}

/// In-memory Frame TV
///
/// Clones share state, so a test can keep a clone to inspect the calls made
/// through a session that was handed to the uploader.
#[derive(Debug, Clone)]
pub struct MockFrameTv {
    config: MockTvConfig,
    state: Arc<Mutex<MockTvState>>,
}

impl MockFrameTv {
    /// Create a mock TV with default behavior
    pub fn new() -> Self {
        Self::with_config(MockTvConfig::default())
    }

    /// Create a mock TV with the given behavior
    pub fn with_config(config: MockTvConfig) -> Self {
        Self {
            config,
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockTvState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: MockCall) {
        self.state().calls.push(call);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Number of upload calls, including failed ones
    pub fn upload_count(&self) -> usize {
        self.state().uploads
    }

    /// Number of times the session was closed
    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Close))
            .count()
    }

    /// File types of all upload calls, in order
    pub fn uploaded_file_types(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Upload { file_type, .. } => Some(file_type),
                _ => None,
            })
            .collect()
    }

    fn status_check(&self, request: &str) -> Result<(), DeviceError> {
        match self.config.status_failure {
            Some(failure) => Err(failure.to_error(request)),
            None => Ok(()),
        }
    }
}

impl Default for MockFrameTv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtSession for MockFrameTv {
    async fn supported(&mut self) -> Result<bool, DeviceError> {
        self.record(MockCall::Supported);
        Ok(self.config.supported)
    }

    async fn is_on(&mut self) -> Result<bool, DeviceError> {
        self.record(MockCall::IsOn);
        self.status_check("device_info")?;
        Ok(self.config.power_on)
    }

    fn art_mode(&self) -> Option<bool> {
        self.config.art_mode
    }

    async fn current_artwork(&mut self) -> Result<ArtworkInfo, DeviceError> {
        self.record(MockCall::CurrentArtwork);
        self.status_check("get_current_artwork")?;
        Ok(ArtworkInfo {
            content_id: self.config.current_content_id.clone(),
            ..Default::default()
        })
    }

    async fn upload(
        &mut self,
        data: Vec<u8>,
        file_type: &str,
        matte: &str,
    ) -> Result<String, DeviceError> {
        self.record(MockCall::Upload {
            file_type: file_type.to_string(),
            matte: matte.to_string(),
            size: data.len(),
        });

        let mut state = self.state();
        state.uploads += 1;
        if self.config.fail_uploads.contains(&state.uploads) {
            return Err(MockFailure::Response.to_error("send_image"));
        }

        state.next_content_id += 1;
        Ok(format!("MY_F{:04}", state.next_content_id))
    }

    async fn set_photo_filter(
        &mut self,
        content_id: &str,
        filter: &str,
    ) -> Result<(), DeviceError> {
        self.record(MockCall::SetPhotoFilter {
            content_id: content_id.to_string(),
            filter: filter.to_string(),
        });
        Ok(())
    }

    async fn select_image(&mut self, content_id: &str, show: bool) -> Result<(), DeviceError> {
        self.record(MockCall::SelectImage {
            content_id: content_id.to_string(),
            show,
        });

        let mut state = self.state();
        state.selects += 1;
        if self.config.fail_selects.contains(&state.selects) {
            return Err(MockFailure::NoData.to_error("select_image"));
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.record(MockCall::Close);
    }
}
