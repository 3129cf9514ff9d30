//! Upload orchestration
//!
//! Drives one run of the uploader against any device implementing
//! [`ArtSession`]:
//! - check that the source folder exists (before any connection is made)
//! - open the session and confirm the TV supports art mode
//! - prepare, upload, filter and select each photo, then move it aside
//! - wait for the TV to settle and close the session
//!
//! A failing photo never stops the batch: it is logged and left in the
//! source folder for the next run. The session is closed on every path once
//! it has been opened.
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_art_uploader::core::config::Config;
//! use frame_art_uploader::core::uploader::{UploadJobConfig, Uploader};
//! use frame_art_uploader::device::{SamsungArtSession, SessionOptions};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load_default()?;
//! let options = SessionOptions::from_config(&config.tv)?;
//!
//! let uploader = Uploader::new(UploadJobConfig::from_config(&config.upload));
//! let outcome = uploader.run(|| SamsungArtSession::connect(options)).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use crate::core::config::UploadConfig;
use crate::core::error::{Result, UploadError};
use crate::core::prepare;
use crate::core::scan;
use crate::device::traits::{ArtSession, DeviceError};
use log::{debug, error, info, warn};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// Configuration
// =============================================================================

/// Settings for one upload run
pub struct UploadJobConfig {
    /// Folder holding photos waiting for upload
    pub source_dir: PathBuf,
    /// Folder receiving photos once uploaded
    pub uploaded_dir: PathBuf,
    /// Photo filter applied to every upload
    pub filter: String,
    /// Combined matte specifier sent with every upload
    pub matte: String,
    /// Pause after the last photo before the session is closed
    pub settle_delay: Duration,
    /// Callback for progress updates
    pub progress_callback: Option<Arc<dyn Fn(UploadProgress) + Send + Sync>>,
}

impl std::fmt::Debug for UploadJobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadJobConfig")
            .field("source_dir", &self.source_dir)
            .field("uploaded_dir", &self.uploaded_dir)
            .field("filter", &self.filter)
            .field("matte", &self.matte)
            .field("settle_delay", &self.settle_delay)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl UploadJobConfig {
    /// Build a job from the `[upload]` config section
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            uploaded_dir: config.uploaded_dir.clone(),
            filter: config.filter.clone(),
            matte: config.matte_specifier(),
            settle_delay: config.settle_delay(),
            progress_callback: None,
        }
    }

    /// Set the settle delay
    pub fn settle_delay(mut self, value: Duration) -> Self {
        self.settle_delay = value;
        self
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }
}

// =============================================================================
// Progress and results
// =============================================================================

/// Progress update information
#[derive(Debug, Clone)]
pub struct UploadProgress {
    /// File currently being processed
    pub current_file: String,
    /// Index of the current file (1-based)
    pub current_index: usize,
    /// Total number of candidate photos
    pub total_files: usize,
    /// Current phase
    pub phase: UploadPhase,
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    /// A photo is being prepared and uploaded
    Uploading,
    /// A photo finished (successfully or not)
    FileDone,
    /// Waiting for the TV before closing
    Settling,
    /// All photos handled
    Complete,
}

/// Statistics from one run
#[derive(Debug, Clone, Default)]
pub struct UploadStats {
    /// Candidate photos found in the source folder
    pub candidates: usize,
    /// Photos uploaded and moved
    pub uploaded: usize,
    /// Photos that vanished before they were processed
    pub skipped: usize,
    /// Photos that failed and stay in the source folder
    pub failed: usize,
    /// Bytes sent to the TV
    pub bytes_uploaded: u64,
    /// Stopped early because shutdown was requested
    pub interrupted: bool,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for UploadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found: {}, Uploaded: {}, Skipped: {}, Failed: {}, Size: {:.2} MB, Duration: {:.2}s",
            self.candidates,
            self.uploaded,
            self.skipped,
            self.failed,
            self.bytes_uploaded as f64 / (1024.0 * 1024.0),
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Result of the guarded device branch
#[derive(Debug, Clone)]
pub enum BranchOutcome {
    /// The TV does not support art mode; nothing was uploaded
    Unsupported,
    /// The branch ran to the end (photo failures are counted in the stats)
    Completed(UploadStats),
    /// The TV answered a session-level request with an error
    DeviceError(String),
    /// The TV never answered a session-level request
    NoData(String),
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The source folder does not exist; no session was opened
    MissingSourceDir(PathBuf),
    /// A session was opened, used and closed
    Finished(BranchOutcome),
}

/// What happened to one photo
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    /// The file disappeared before it was processed
    Vanished,
    /// Uploaded, filtered, selected and moved
    Uploaded {
        content_id: String,
        moved_to: PathBuf,
        bytes: u64,
    },
}

// =============================================================================
// Uploader
// =============================================================================

/// Runs the upload workflow against an [`ArtSession`]
pub struct Uploader {
    config: UploadJobConfig,
    shutdown_flag: Arc<AtomicBool>,
}

impl Uploader {
    /// Create a new uploader with the given configuration
    pub fn new(config: UploadJobConfig) -> Self {
        Self {
            config,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new uploader with a shared shutdown flag
    pub fn with_shutdown_flag(config: UploadJobConfig, flag: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_flag: flag,
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Get the job configuration
    pub fn config(&self) -> &UploadJobConfig {
        &self.config
    }

    /// Run the whole workflow
    ///
    /// `connect` is only called once the source folder is known to exist.
    /// Connection failures and errors outside the two guarded categories are
    /// returned, after the session (if any) has been closed.
    pub async fn run<S, F, Fut>(&self, connect: F) -> Result<RunOutcome>
    where
        S: ArtSession,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<S, DeviceError>>,
    {
        info!("Matte: {}, filter: {}", self.config.matte, self.config.filter);

        if !self.config.source_dir.exists() {
            error!(
                "Folder {} does not exist",
                self.config.source_dir.display()
            );
            return Ok(RunOutcome::MissingSourceDir(self.config.source_dir.clone()));
        }

        let mut session = connect().await?;
        let branch = self.device_branch(&mut session).await;
        session.close().await;

        branch.map(RunOutcome::Finished)
    }

    /// Everything between opening and closing the session
    async fn device_branch<S: ArtSession>(&self, session: &mut S) -> Result<BranchOutcome> {
        let supported = session.supported().await?;
        if !supported {
            info!("This TV is not supported");
            return Ok(BranchOutcome::Unsupported);
        }
        info!("This TV is supported");

        match self.upload_all(session).await {
            Ok(stats) => Ok(BranchOutcome::Completed(stats)),
            Err(UploadError::Device(e)) if e.is_response() => {
                warn!("ERROR: {}", e);
                Ok(BranchOutcome::DeviceError(e.to_string()))
            }
            Err(UploadError::Device(e)) if e.is_no_data() => {
                warn!("no data received: {}", e);
                Ok(BranchOutcome::NoData(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// The guarded part of the branch: status queries and the photo loop
    async fn upload_all<S: ArtSession>(&self, session: &mut S) -> Result<UploadStats> {
        let start_time = Instant::now();
        let mut stats = UploadStats::default();

        let tv_on = session.is_on().await?;
        info!("tv is on: {}", tv_on);

        let art_mode = session.art_mode();
        info!(
            "art mode is on: {}",
            art_mode.map_or("unknown".to_string(), |on| on.to_string())
        );

        let current = session.current_artwork().await?;
        debug!("current artwork: {}", current);

        let photos = scan::find_photos(&self.config.source_dir)?;
        stats.candidates = photos.len();
        if photos.is_empty() {
            info!("No PNG or JPG photos found in the folder");
            return Ok(stats);
        }
        info!("Found {} photos to upload", photos.len());

        for (index, photo) in photos.iter().enumerate() {
            if self.is_shutdown_requested() {
                warn!("Shutdown requested, stopping before {}", display_name(photo));
                stats.interrupted = true;
                break;
            }

            self.report_progress(photo, index + 1, photos.len(), UploadPhase::Uploading);

            match self.process_photo(session, photo).await {
                Ok(PhotoOutcome::Vanished) => {
                    debug!("{} no longer exists, skipping", photo.display());
                    stats.skipped += 1;
                }
                Ok(PhotoOutcome::Uploaded { bytes, .. }) => {
                    stats.uploaded += 1;
                    stats.bytes_uploaded += bytes;
                }
                Err(e) => {
                    warn!("Error processing photo {}: {}", display_name(photo), e);
                    stats.failed += 1;
                }
            }

            self.report_progress(photo, index + 1, photos.len(), UploadPhase::FileDone);
        }

        if stats.interrupted {
            debug!("Skipping settle delay after shutdown request");
        } else if !self.config.settle_delay.is_zero() {
            info!(
                "Waiting {}s for the TV to settle",
                self.config.settle_delay.as_secs()
            );
            self.report_progress(
                &self.config.source_dir,
                photos.len(),
                photos.len(),
                UploadPhase::Settling,
            );
            tokio::time::sleep(self.config.settle_delay).await;
        }

        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        self.report_progress(
            &self.config.source_dir,
            photos.len(),
            photos.len(),
            UploadPhase::Complete,
        );
        info!("Upload finished: {}", stats);
        Ok(stats)
    }

    /// Prepare, upload, filter, select and move a single photo
    pub async fn process_photo<S: ArtSession>(
        &self,
        session: &mut S,
        photo: &Path,
    ) -> Result<PhotoOutcome> {
        // Another process may have moved it since the folder was listed
        if !photo.exists() {
            return Ok(PhotoOutcome::Vanished);
        }

        let path = prepare::normalize_file_name(photo)?;
        info!("Processing photo: {}", path.display());

        let resize_path = path.clone();
        tokio::task::spawn_blocking(move || prepare::resize_for_panel(&resize_path))
            .await
            .map_err(|e| UploadError::image(&path, e))??;

        let data = tokio::fs::read(&path).await?;
        let bytes = data.len() as u64;
        let file_type = scan::file_type_tag(&path)
            .ok_or_else(|| UploadError::UnsupportedFileType(path.display().to_string()))?;

        let content_id = session.upload(data, &file_type, &self.config.matte).await?;
        info!("uploaded {} to tv as {}", path.display(), content_id);

        session
            .set_photo_filter(&content_id, &self.config.filter)
            .await?;

        session.select_image(&content_id, false).await?;
        info!("set artwork to {}", content_id);

        let moved_to = move_to_folder(&path, &self.config.uploaded_dir)?;
        info!("moved {} to {}", path.display(), moved_to.display());

        Ok(PhotoOutcome::Uploaded {
            content_id,
            moved_to,
            bytes,
        })
    }

    fn report_progress(&self, file: &Path, index: usize, total: usize, phase: UploadPhase) {
        if let Some(ref callback) = self.config.progress_callback {
            callback(UploadProgress {
                current_file: display_name(file),
                current_index: index,
                total_files: total,
                phase,
            });
        }
    }
}

/// Move `file` into `folder`, keeping its name
///
/// Falls back to copy-and-delete when the folders are on different
/// filesystems.
pub fn move_to_folder(file: &Path, folder: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| UploadError::MoveError {
        from: file.to_path_buf(),
        to: folder.to_path_buf(),
        message: "no file name".to_string(),
    })?;
    let target = folder.join(name);

    let move_error = |message: String| UploadError::MoveError {
        from: file.to_path_buf(),
        to: target.clone(),
        message,
    };

    if !folder.exists() {
        fs::create_dir_all(folder).map_err(|e| move_error(e.to_string()))?;
    }

    if fs::rename(file, &target).is_err() {
        fs::copy(file, &target).map_err(|e| move_error(e.to_string()))?;
        fs::remove_file(file).map_err(|e| move_error(e.to_string()))?;
    }

    Ok(target)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
