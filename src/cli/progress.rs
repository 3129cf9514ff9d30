//! Progress bar utilities for CLI output
//!
//! This module provides the batch progress bar shown while photos are being
//! uploaded, plus a few console helpers shared by the commands.
//!
//! Key features:
//! - A bar fed straight from the uploader's progress callback
//! - Consistent visual styling across all operations

use crate::core::uploader::{UploadPhase, UploadProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Get the progress bar style for upload operations
fn progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

/// Get the style for completed progress bars
fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

// ============================================================================
// Progress tracker for upload runs
// ============================================================================

/// Progress bar driven by the uploader's progress callback
///
/// Cloning is cheap and every clone drives the same bar, so one clone can
/// be moved into the callback while the command keeps another.
#[derive(Clone)]
pub struct UploadProgressBar {
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl UploadProgressBar {
    /// Create a progress bar; its length is set by the first update
    pub fn new() -> Self {
        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(progress_bar_style());
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_message("Connecting...");

        Self {
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// Apply one update from the uploader
    pub fn update(&self, progress: &UploadProgress) {
        match progress.phase {
            UploadPhase::Uploading => {
                self.progress_bar.set_length(progress.total_files as u64);
                self.progress_bar.set_message(progress.current_file.clone());
            }
            UploadPhase::FileDone => {
                self.progress_bar.set_position(progress.current_index as u64);
            }
            UploadPhase::Settling => {
                self.progress_bar
                    .set_message("Waiting for the TV to settle...");
            }
            UploadPhase::Complete => self.finish(),
        }
    }

    /// Finish the progress display
    pub fn finish(&self) {
        if self.progress_bar.is_finished() {
            return;
        }
        self.progress_bar.set_style(completed_style());
        self.progress_bar.finish_with_message(format!(
            "Complete in {}",
            format_duration(self.start_time.elapsed())
        ));
    }

    /// Remove the bar without a summary, e.g. when nothing was uploaded
    pub fn clear(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl Default for UploadProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================
