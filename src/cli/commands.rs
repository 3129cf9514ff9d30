//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{
    format_bytes, format_duration, print_error, print_header, print_info, print_success,
    print_warning, UploadProgressBar,
};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, Config, TvConfig};
use crate::core::uploader::{BranchOutcome, RunOutcome, UploadJobConfig, UploadStats, Uploader};
use crate::device::{DeviceError, SamsungArtSession, SessionOptions};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Some(Commands::ShowConfig) => {
            show_config(config);
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
        None => {
            upload_photos(config, shutdown_flag)?;
        }
    }

    Ok(())
}

/// Upload every photo in the source folder to the TV
pub fn upload_photos(config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let progress = UploadProgressBar::new();
    let bar = progress.clone();
    let job = UploadJobConfig::from_config(&config.upload).with_progress(move |update| {
        bar.update(&update);
    });

    debug!("Upload job: {:?}", job);
    let uploader = Uploader::with_shutdown_flag(job, shutdown_flag);
    let tv = config.tv.clone();

    let outcome = runtime.block_on(uploader.run(move || connect(tv)));

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.clear();
            return Err(e.into());
        }
    };

    match outcome {
        RunOutcome::MissingSourceDir(path) => {
            progress.clear();
            print_error(&format!("Folder {} does not exist", path.display()));
        }
        RunOutcome::Finished(BranchOutcome::Unsupported) => {
            progress.clear();
            print_warning("This TV does not support art mode uploads");
        }
        RunOutcome::Finished(BranchOutcome::DeviceError(message)) => {
            progress.clear();
            print_error(&format!("The TV rejected a request: {}", message));
        }
        RunOutcome::Finished(BranchOutcome::NoData(message)) => {
            progress.clear();
            print_error(&format!("No data received from the TV: {}", message));
        }
        RunOutcome::Finished(BranchOutcome::Completed(stats)) => {
            if stats.candidates == 0 {
                progress.clear();
            } else {
                progress.finish();
            }
            print_summary(&stats);
        }
    }

    Ok(())
}

/// Open a session using the `[tv]` settings
async fn connect(tv: TvConfig) -> std::result::Result<SamsungArtSession, DeviceError> {
    let options = SessionOptions::from_config(&tv)?;
    SamsungArtSession::connect(options).await
}

/// Print the summary of a completed run
fn print_summary(stats: &UploadStats) {
    print_header("UPLOAD COMPLETE");

    if stats.candidates == 0 {
        print_info("No PNG or JPG photos found in the folder");
        return;
    }

    print_success(&format!("Uploaded: {}", stats.uploaded));
    if stats.skipped > 0 {
        print_info(&format!("Skipped: {}", stats.skipped));
    }
    if stats.failed > 0 {
        print_warning(&format!(
            "Failed: {} (left in the source folder for the next run)",
            stats.failed
        ));
    }
    print_info(&format!("Sent: {}", format_bytes(stats.bytes_uploaded)));
    print_info(&format!(
        "Time: {}",
        format_duration(Duration::from_millis(stats.duration_ms))
    ));
    if stats.interrupted {
        print_warning("Stopped early at your request");
    }
}

/// Generate a configuration file at the specified or default location
pub fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let output_path = match output {
        Some(path) => path,
        None => get_config_path().context("Could not determine the config directory")?,
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    fs::write(&output_path, Config::generate_default_config())
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Configuration file: {}", output_path.display());
    info!("Edit this file to set the TV address and folders.");

    Ok(())
}

/// Show the current configuration settings
pub fn show_config(config: &Config) {
    let config_path = Config::get_active_config_path();
    info!("Configuration file: {}", config_path.display());
    if !config_path.exists() {
        info!("(Using default settings - no config file found)");
    }
    info!("");
    info!("Current Configuration:");
    info!("----------------------");
    info!("[tv]");
    info!(
        "  host = {:?}",
        config.tv.host.as_deref().unwrap_or("(not set)")
    );
    info!("  port = {}", config.tv.port);
    info!("  client_name = \"{}\"", config.tv.client_name);
    info!(
        "  token_file = {:?}",
        config
            .tv
            .token_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    info!("  request_timeout_secs = {}", config.tv.request_timeout_secs);
    info!("");
    info!("[upload]");
    info!("  source_dir = \"{}\"", config.upload.source_dir.display());
    info!(
        "  uploaded_dir = \"{}\"",
        config.upload.uploaded_dir.display()
    );
    info!("  filter = \"{}\"", config.upload.filter);
    info!("  matte = \"{}\"", config.upload.matte);
    info!("  matte_color = \"{}\"", config.upload.matte_color);
    info!("  # sent to the TV as \"{}\"", config.upload.matte_specifier());
    info!("  settle_delay_secs = {}", config.upload.settle_delay_secs);
    info!("");
    info!("[logging]");
    info!("  level = \"{}\"", config.logging.level);
    info!("  log_to_file = {}", config.logging.log_to_file);
    info!("  log_file = \"{}\"", config.logging.log_file.display());
}
