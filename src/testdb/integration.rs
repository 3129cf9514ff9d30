//! Integration tests using the real Uploader with a mock TV
//!
//! These tests run the whole upload workflow against real folders on disk
//! and a [`MockFrameTv`], checking:
//! - which photos are picked up, renamed, uploaded and moved
//! - that one failing photo never stops the batch
//! - how session-level errors are reported
//! - that the session is closed exactly when it was opened

use super::generator::{file_names, write_test_photo, write_text_file};
use super::mock_tv::{MockCall, MockFailure, MockFrameTv, MockTvConfig};
use crate::core::config::UploadConfig;
use crate::core::error::{Result, UploadError};
use crate::core::prepare::{TARGET_HEIGHT, TARGET_WIDTH};
use crate::core::uploader::{
    BranchOutcome, PhotoOutcome, RunOutcome, UploadJobConfig, UploadPhase, UploadStats, Uploader,
};
use crate::device::traits::DeviceError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Source and uploaded folders in a scratch directory
struct Folders {
    _root: TempDir,
    source: PathBuf,
    uploaded: PathBuf,
}

impl Folders {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("frame");
        let uploaded = root.path().join("frame-uploaded");
        std::fs::create_dir(&source).unwrap();
        std::fs::create_dir(&uploaded).unwrap();
        Self {
            _root: root,
            source,
            uploaded,
        }
    }

    fn job(&self) -> UploadJobConfig {
        self.job_with(UploadConfig::default())
    }

    fn job_with(&self, config: UploadConfig) -> UploadJobConfig {
        let config = UploadConfig {
            source_dir: self.source.clone(),
            uploaded_dir: self.uploaded.clone(),
            ..config
        };
        UploadJobConfig::from_config(&config).settle_delay(Duration::ZERO)
    }
}

async fn run_with(uploader: &Uploader, tv: &MockFrameTv) -> Result<RunOutcome> {
    let tv = tv.clone();
    uploader.run(|| async move { Ok(tv) }).await
}

fn completed(outcome: RunOutcome) -> UploadStats {
    match outcome {
        RunOutcome::Finished(BranchOutcome::Completed(stats)) => stats,
        other => panic!("expected a completed run, got {:?}", other),
    }
}

fn photo(folder: &Path, name: &str) {
    write_test_photo(folder, name).unwrap();
}

#[tokio::test]
async fn test_end_to_end_mixed_folder() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    write_text_file(&folders.source, "b.txt").unwrap();
    photo(&folders.source, "C.JPEG");

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(folders.job());
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.uploaded, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(file_names(&folders.uploaded), vec!["a.png", "c.jpeg"]);
    assert_eq!(file_names(&folders.source), vec!["b.txt"]);
    assert_eq!(tv.upload_count(), 2);
    assert_eq!(tv.close_count(), 1);

    // Files are handled in name order
    assert_eq!(tv.uploaded_file_types(), vec!["jpeg", "png"]);

    for name in ["a.png", "c.jpeg"] {
        assert_eq!(
            image::image_dimensions(folders.uploaded.join(name)).unwrap(),
            (TARGET_WIDTH, TARGET_HEIGHT)
        );
    }
}

#[tokio::test]
async fn test_call_sequence_per_photo() {
    let folders = Folders::new();
    photo(&folders.source, "only.png");

    let tv = MockFrameTv::new();
    let config = UploadConfig {
        filter: "ink".to_string(),
        matte: "shadowbox".to_string(),
        matte_color: "polar".to_string(),
        ..Default::default()
    };
    let uploader = Uploader::new(folders.job_with(config));
    completed(run_with(&uploader, &tv).await.unwrap());

    let calls = tv.calls();
    assert_eq!(calls[0], MockCall::Supported);
    assert_eq!(calls[1], MockCall::IsOn);
    assert_eq!(calls[2], MockCall::CurrentArtwork);
    assert!(matches!(
        &calls[3],
        MockCall::Upload { file_type, matte, size }
            if file_type == "png" && matte == "shadowbox_polar" && *size > 0
    ));
    assert_eq!(
        calls[4],
        MockCall::SetPhotoFilter {
            content_id: "MY_F0001".to_string(),
            filter: "ink".to_string(),
        }
    );
    assert_eq!(
        calls[5],
        MockCall::SelectImage {
            content_id: "MY_F0001".to_string(),
            show: false,
        }
    );
    assert_eq!(calls[6], MockCall::Close);
    assert_eq!(calls.len(), 7);
}

#[tokio::test]
async fn test_uppercase_name_is_lowercased_before_upload() {
    let folders = Folders::new();
    photo(&folders.source, "Photo.JPG");

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(folders.job());
    completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(tv.uploaded_file_types(), vec!["jpg"]);
    assert_eq!(file_names(&folders.uploaded), vec!["photo.jpg"]);
    assert!(file_names(&folders.source).is_empty());
}

#[tokio::test]
async fn test_process_photo_skips_vanished_file() {
    let folders = Folders::new();
    let path = write_test_photo(&folders.source, "gone.png").unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut tv = MockFrameTv::new();
    let uploader = Uploader::new(folders.job());
    let outcome = uploader.process_photo(&mut tv, &path).await.unwrap();

    assert_eq!(outcome, PhotoOutcome::Vanished);
    assert_eq!(tv.upload_count(), 0);
    assert!(tv.calls().is_empty());
}

#[tokio::test]
async fn test_photo_removed_after_listing_is_skipped() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    photo(&folders.source, "b.png");

    // Another process takes b.png while a.png is being handled
    let doomed = folders.source.join("b.png");
    let job = folders.job().with_progress(move |update| {
        if update.current_index == 1 && update.phase == UploadPhase::Uploading {
            let _ = std::fs::remove_file(&doomed);
        }
    });

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(job);
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.uploaded, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(tv.upload_count(), 1);
    assert_eq!(file_names(&folders.uploaded), vec!["a.png"]);
}

#[tokio::test]
async fn test_failed_upload_keeps_file_and_continues() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    photo(&folders.source, "b.png");
    photo(&folders.source, "c.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        fail_uploads: vec![1],
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.uploaded, 2);
    assert_eq!(tv.upload_count(), 3);
    assert_eq!(file_names(&folders.source), vec!["a.png"]);
    assert_eq!(file_names(&folders.uploaded), vec!["b.png", "c.png"]);
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_failed_select_keeps_file() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    photo(&folders.source, "b.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        fail_selects: vec![2],
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.uploaded, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(file_names(&folders.uploaded), vec!["a.png"]);
    assert_eq!(file_names(&folders.source), vec!["b.png"]);
}

#[tokio::test]
async fn test_corrupt_photo_does_not_stop_batch() {
    let folders = Folders::new();
    std::fs::write(folders.source.join("a.jpg"), b"garbage").unwrap();
    photo(&folders.source, "b.jpg");

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(folders.job());
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.uploaded, 1);
    assert_eq!(tv.upload_count(), 1);
    assert_eq!(file_names(&folders.source), vec!["a.jpg"]);
}

#[tokio::test]
async fn test_missing_source_folder_never_connects() {
    let folders = Folders::new();
    let mut job = folders.job();
    job.source_dir = folders.source.join("does-not-exist");

    let connects = Arc::new(AtomicUsize::new(0));
    let tv = MockFrameTv::new();
    let uploader = Uploader::new(job);

    let counter = connects.clone();
    let session = tv.clone();
    let outcome = uploader
        .run(|| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(session)
        })
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::MissingSourceDir(_)));
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    assert_eq!(tv.upload_count(), 0);
    assert_eq!(tv.close_count(), 0);
}

#[tokio::test]
async fn test_empty_folder_still_closes() {
    let folders = Folders::new();
    write_text_file(&folders.source, "readme.txt").unwrap();

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(folders.job());
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert_eq!(stats.candidates, 0);
    assert_eq!(tv.upload_count(), 0);
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_unsupported_tv_skips_uploads() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        supported: false,
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let outcome = run_with(&uploader, &tv).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Finished(BranchOutcome::Unsupported)
    ));
    assert_eq!(tv.calls(), vec![MockCall::Supported, MockCall::Close]);
    assert_eq!(file_names(&folders.source), vec!["a.png"]);
}

#[tokio::test]
async fn test_device_response_error_is_contained() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        status_failure: Some(MockFailure::Response),
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let outcome = run_with(&uploader, &tv).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Finished(BranchOutcome::DeviceError(_))
    ));
    assert_eq!(tv.upload_count(), 0);
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_no_data_error_is_contained() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        status_failure: Some(MockFailure::NoData),
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let outcome = run_with(&uploader, &tv).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Finished(BranchOutcome::NoData(_))
    ));
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_other_errors_propagate_after_close() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");

    let tv = MockFrameTv::with_config(MockTvConfig {
        status_failure: Some(MockFailure::Connection),
        ..Default::default()
    });
    let uploader = Uploader::new(folders.job());
    let err = run_with(&uploader, &tv).await.unwrap_err();

    assert!(matches!(
        err,
        UploadError::Device(DeviceError::Connection(_))
    ));
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_connect_failure_propagates_without_close() {
    let folders = Folders::new();
    let uploader = Uploader::new(folders.job());

    let result = uploader
        .run(|| async { Err::<MockFrameTv, _>(DeviceError::Unauthorized) })
        .await;

    assert!(matches!(
        result,
        Err(UploadError::Device(DeviceError::Unauthorized))
    ));
}

#[tokio::test]
async fn test_shutdown_stops_before_next_photo() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    photo(&folders.source, "b.png");

    let flag = Arc::new(AtomicBool::new(true));
    let tv = MockFrameTv::new();
    let uploader = Uploader::with_shutdown_flag(folders.job(), flag);
    let stats = completed(run_with(&uploader, &tv).await.unwrap());

    assert!(stats.interrupted);
    assert_eq!(tv.upload_count(), 0);
    assert_eq!(tv.close_count(), 1);
    assert_eq!(file_names(&folders.source), vec!["a.png", "b.png"]);
}

#[tokio::test]
async fn test_shutdown_skips_settle_delay() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");

    let flag = Arc::new(AtomicBool::new(true));
    let tv = MockFrameTv::new();
    let job = folders.job().settle_delay(Duration::from_secs(3600));
    let uploader = Uploader::with_shutdown_flag(job, flag);

    let outcome = tokio::time::timeout(Duration::from_secs(10), run_with(&uploader, &tv))
        .await
        .expect("run waited for the settle delay after shutdown");
    let stats = completed(outcome.unwrap());

    assert!(stats.interrupted);
    assert_eq!(tv.close_count(), 1);
}

#[tokio::test]
async fn test_progress_callback_sees_every_photo() {
    let folders = Folders::new();
    photo(&folders.source, "a.png");
    photo(&folders.source, "b.png");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let job = folders.job().with_progress(move |update| {
        sink.lock()
            .unwrap()
            .push((update.current_index, update.total_files, update.phase));
    });

    let tv = MockFrameTv::new();
    let uploader = Uploader::new(job);
    completed(run_with(&uploader, &tv).await.unwrap());

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (1, 2, UploadPhase::Uploading),
            (1, 2, UploadPhase::FileDone),
            (2, 2, UploadPhase::Uploading),
            (2, 2, UploadPhase::FileDone),
            (2, 2, UploadPhase::Complete),
        ]
    );
}
