//! # Saorsa Deck CLI
//!
//! Headless host for the slide layout engine.
//!
//! Fetches a generated presentation project from the backend (or reads one
//! saved to disk), runs every slide through layout measurement and adaptive
//! scaling without a display, and exports the deck.
//!
//! ## Usage
//!
//! ```bash
//! deck --project-id 42 --output review.pptx
//! deck --input project.json --output preview.svg
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `DeckConfig` - Resolved configuration for a run
//! - `ProjectClient` - Backend client with retry and status polling
//! - `HeadlessHost` - Template-driven rendering surface and text-size probe

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod client;
mod headless;

pub use client::{ClientError, PollConfig, Project, ProjectClient, ProjectStatus, RetryConfig};
pub use headless::{EstimatingProbe, HeadlessHost, HeadlessReport, HostConfig, TemplateSurface};

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use deck_core::{Size, DEFAULT_SAFETY_TIMEOUT};
use deck_export::{DensityMode, ExportConfig, ExportFormat, DEFAULT_IMAGE_ASPECT};

/// Command-line arguments for deck.
#[derive(Debug, Clone, Parser)]
#[command(name = "deck")]
#[command(about = "Lay out a generated slide deck and export it")]
#[command(version)]
pub struct CliArgs {
    /// Backend API base URL
    #[arg(long, env = "DECK_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Project to fetch from the backend
    #[arg(long, env = "DECK_PROJECT_ID", conflicts_with = "input")]
    pub project_id: Option<String>,

    /// Saved project or slide array (JSON) to export instead of fetching
    #[arg(long, env = "DECK_INPUT")]
    pub input: Option<PathBuf>,

    /// Output file
    #[arg(long, short, env = "DECK_OUTPUT", default_value = "deck.pptx")]
    pub output: PathBuf,

    /// Output format (pptx, svg, json); defaults to the output extension
    #[arg(long, env = "DECK_FORMAT")]
    pub format: Option<ExportFormat>,

    /// Presentation title; defaults to the first slide's title
    #[arg(long)]
    pub title: Option<String>,

    /// When to apply the character-density font factor
    #[arg(long, env = "DECK_DENSITY_MODE", default_value = "when-unmeasured", value_parser = parse_density_mode)]
    pub density_mode: DensityMode,

    /// Width over height of slide images
    #[arg(long, env = "DECK_IMAGE_ASPECT", default_value_t = DEFAULT_IMAGE_ASPECT)]
    pub image_aspect: f64,

    /// Seconds between backend status polls
    #[arg(long, default_value = "5")]
    pub poll_interval_secs: u64,

    /// Give up polling after this many polls
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Seconds to wait for layouts before exporting what was measured
    #[arg(long, default_value_t = DEFAULT_SAFETY_TIMEOUT.as_secs())]
    pub safety_timeout_secs: u64,

    /// Virtual slide width in pixels
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Virtual slide height in pixels
    #[arg(long, default_value = "720")]
    pub height: u32,
}

/// Parse a density mode name.
///
/// # Errors
///
/// Returns a message listing the accepted names.
pub fn parse_density_mode(s: &str) -> Result<DensityMode, String> {
    serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
        .map_err(|_| format!("unknown density mode {s:?} (expected when-unmeasured, always or never)"))
}

/// Where the slides come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// Poll the backend for a project.
    Remote {
        /// API base URL.
        api_url: String,
        /// Project ID.
        project_id: String,
    },
    /// Read a saved project from disk.
    File(PathBuf),
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Slide source, if one was given.
    pub source: Option<ProjectSource>,
    /// Output path.
    pub output: PathBuf,
    /// Output format.
    pub format: ExportFormat,
    /// Export settings.
    pub export: ExportConfig,
    /// Backend polling.
    pub poll: PollConfig,
    /// Headless measurement.
    pub host: HostConfig,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckConfig {
    /// Create a configuration with default values and no source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            output: PathBuf::from("deck.pptx"),
            format: ExportFormat::Pptx,
            export: ExportConfig::default(),
            poll: PollConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl From<CliArgs> for DeckConfig {
    fn from(args: CliArgs) -> Self {
        let source = match (args.input, args.project_id) {
            (Some(path), _) => Some(ProjectSource::File(path)),
            (None, Some(project_id)) => Some(ProjectSource::Remote {
                api_url: args.api_url,
                project_id,
            }),
            (None, None) => None,
        };
        let format = args
            .format
            .or_else(|| ExportFormat::from_path(&args.output))
            .unwrap_or(ExportFormat::Pptx);

        Self {
            source,
            output: args.output,
            format,
            export: ExportConfig {
                density_mode: args.density_mode,
                title: args.title,
                image_aspect: if args.image_aspect.is_finite() && args.image_aspect > 0.0 {
                    args.image_aspect
                } else {
                    DEFAULT_IMAGE_ASPECT
                },
                ..ExportConfig::default()
            },
            poll: PollConfig {
                interval: Duration::from_secs(args.poll_interval_secs.max(1)),
                max_polls: args.max_polls,
            },
            host: HostConfig {
                surface: Size::new(f64::from(args.width.max(1)), f64::from(args.height.max(1))),
                safety_timeout: Duration::from_secs(args.safety_timeout_secs),
                ..HostConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DeckConfig {
        let mut argv = vec!["deck"];
        argv.extend_from_slice(args);
        CliArgs::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert_eq!(config.format, ExportFormat::Pptx);
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.host.safety_timeout, DEFAULT_SAFETY_TIMEOUT);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_remote_source_and_format_from_extension() {
        let config = parse(&["--project-id", "42", "--output", "out/review.svg"]);
        assert_eq!(
            config.source,
            Some(ProjectSource::Remote {
                api_url: "http://localhost:5000".to_string(),
                project_id: "42".to_string(),
            })
        );
        assert_eq!(config.format, ExportFormat::Svg);
    }

    #[test]
    fn test_explicit_format_and_file_source() {
        let config = parse(&[
            "--input",
            "saved.json",
            "--output",
            "deck.bin",
            "--format",
            "json",
            "--density-mode",
            "never",
            "--safety-timeout-secs",
            "2",
            "--image-aspect",
            "1.5",
        ]);
        assert_eq!(config.source, Some(ProjectSource::File(PathBuf::from("saved.json"))));
        assert_eq!(config.format, ExportFormat::Json);
        assert_eq!(config.export.density_mode, DensityMode::Never);
        assert_eq!(config.host.safety_timeout, Duration::from_secs(2));
        assert!((config.export.image_aspect - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unusable_image_aspect_falls_back() {
        let config = parse(&["--image-aspect", "0"]);
        assert!((config.export.image_aspect - DEFAULT_IMAGE_ASPECT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_input_conflicts_with_project_id() {
        assert!(CliArgs::try_parse_from(["deck", "--input", "a.json", "--project-id", "1"]).is_err());
    }

    #[test]
    fn test_density_mode_names() {
        assert_eq!(parse_density_mode("Always"), Ok(DensityMode::Always));
        assert_eq!(parse_density_mode("when-unmeasured"), Ok(DensityMode::WhenUnmeasured));
        assert!(parse_density_mode("sometimes").is_err());
    }
}
