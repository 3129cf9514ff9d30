//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use crate::core::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Upload photos from a folder to a Samsung Frame TV's art gallery
#[derive(Parser, Debug)]
#[command(name = "frame-art-upload")]
#[command(version)]
#[command(about = "Upload photos from a folder to a Samsung Frame TV art gallery", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// IP address or host name of the Frame TV (overrides config)
    #[arg(long)]
    pub ip: Option<String>,

    /// Art channel port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Photo filter applied to every upload, e.g. ink or none (overrides config)
    #[arg(long)]
    pub filter: Option<String>,

    /// Matte style, e.g. shadowbox, modern or none (overrides config)
    #[arg(long)]
    pub matte: Option<String>,

    /// Matte color, e.g. black, polar or warm (overrides config)
    #[arg(long = "matte-color")]
    pub matte_color: Option<String>,

    /// Folder holding photos waiting for upload (overrides config)
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Folder that receives photos once uploaded (overrides config)
    #[arg(long)]
    pub uploaded_dir: Option<PathBuf>,

    /// File used to store the pairing token (overrides config)
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Seconds to wait after the last upload before disconnecting (overrides config)
    #[arg(long, value_name = "SECS")]
    pub settle_secs: Option<u64>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref ip) = self.ip {
            config.tv.host = Some(ip.clone());
        }
        if let Some(port) = self.port {
            config.tv.port = port;
        }
        if let Some(ref token_file) = self.token_file {
            config.tv.token_file = Some(token_file.clone());
        }
        if let Some(ref filter) = self.filter {
            config.upload.filter = filter.clone();
        }
        if let Some(ref matte) = self.matte {
            config.upload.matte = matte.clone();
        }
        if let Some(ref color) = self.matte_color {
            config.upload.matte_color = color.clone();
        }
        if let Some(ref dir) = self.source_dir {
            config.upload.source_dir = dir.clone();
        }
        if let Some(ref dir) = self.uploaded_dir {
            config.upload.uploaded_dir = dir.clone();
        }
        if let Some(secs) = self.settle_secs {
            config.upload.settle_delay_secs = secs;
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("frame-art-upload").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_arguments_keeps_config() {
        let args = parse(&[]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert!(args.command.is_none());
        assert_eq!(config.tv.host, None);
        assert_eq!(config.upload.matte_specifier(), "none");
        assert_eq!(config.upload.filter, "none");
    }

    #[test]
    fn test_overrides_applied() {
        let args = parse(&[
            "--ip",
            "192.168.1.20",
            "--filter",
            "ink",
            "--matte",
            "shadowbox",
            "--matte-color",
            "polar",
            "--source-dir",
            "/tmp/in",
            "--uploaded-dir",
            "/tmp/out",
            "--settle-secs",
            "0",
            "-l",
            "debug",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.tv.host.as_deref(), Some("192.168.1.20"));
        assert_eq!(config.upload.filter, "ink");
        assert_eq!(config.upload.matte_specifier(), "shadowbox_polar");
        assert_eq!(config.upload.source_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.upload.uploaded_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.upload.settle_delay_secs, 0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_matte_color_alone_keeps_no_matte() {
        let args = parse(&["--matte-color", "warm"]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.upload.matte_color, "warm");
        assert_eq!(config.upload.matte_specifier(), "none");
    }

    #[test]
    fn test_subcommands() {
        assert!(matches!(
            parse(&["show-config"]).command,
            Some(Commands::ShowConfig)
        ));
        match parse(&["generate-config", "-o", "out.toml"]).command {
            Some(Commands::GenerateConfig { output }) => {
                assert_eq!(output, Some(PathBuf::from("out.toml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Args::try_parse_from(["frame-art-upload", "--port", "not-a-port"]);
        assert!(result.is_err());
    }
}
