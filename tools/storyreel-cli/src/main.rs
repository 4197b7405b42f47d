//! Storyreel CLI: turn narration scripts into vertical videos.
//!
//! Usage:
//!   storyreel render <INPUT>     Render every project in the input document
//!   storyreel plan <INPUT>       Synthesize and group without rendering
//!   storyreel validate <INPUT>   Check the input document
//!   storyreel check              Check for required external tools

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storyreel_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "storyreel",
    about = "Narrated vertical videos from plain-text scripts",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every project to <output>/<name>.mp4
    Render {
        /// Input document (JSON array of projects)
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Fill missing images with plain placeholder frames
        #[arg(long)]
        placeholders: bool,

        /// Write ffmpeg and verification reports next to each video
        #[arg(long)]
        debug_reports: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize and group segments, request images, but do not render
    Plan {
        /// Input document (JSON array of projects)
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Write placeholder images where none exist yet
        #[arg(long)]
        placeholders: bool,
    },

    /// Validate an input document
    Validate {
        /// Input document (JSON array of projects)
        input: PathBuf,
    },

    /// Check system capabilities
    Check,
}

/// Command-line overrides applied on top of the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Transient storage root (removed after each render run)
    #[arg(long)]
    temp: Option<PathBuf>,

    /// Synthesis voice
    #[arg(long)]
    voice: Option<String>,

    /// Segment duration ceiling in seconds
    #[arg(long)]
    threshold: Option<f64>,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Zoom factor reached at the end of each segment
    #[arg(long)]
    zoom: Option<f64>,
}

impl Overrides {
    fn apply(self, config: &mut AppConfig) {
        if let Some(output) = self.output {
            config.paths.output_dir = output;
        }
        if let Some(temp) = self.temp {
            config.paths.temp_dir = temp;
        }
        if let Some(voice) = self.voice {
            config.pipeline.voice = voice;
        }
        if let Some(threshold) = self.threshold {
            config.pipeline.segment_threshold_secs = threshold;
        }
        if let Some(fps) = self.fps {
            config.pipeline.fps = fps;
        }
        if let Some(zoom) = self.zoom {
            config.pipeline.zoom_ratio = zoom;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    // Initialize logging
    storyreel_common::logging::init_logging(&LoggingConfig {
        level: if cli.verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        json: cli.json_logs || config.logging.json,
    });

    match cli.command {
        Commands::Render {
            input,
            overrides,
            placeholders,
            debug_reports,
            json,
        } => {
            overrides.apply(&mut config);
            config.encode.debug_reports |= debug_reports;
            commands::render::run(config, input, placeholders, json).await
        }
        Commands::Plan {
            input,
            overrides,
            placeholders,
        } => {
            overrides.apply(&mut config);
            commands::plan::run(config, input, placeholders).await
        }
        Commands::Validate { input } => commands::validate::run(&config, input),
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = AppConfig::default();
        Overrides {
            output: Some(PathBuf::from("videos")),
            threshold: Some(4.5),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.paths.output_dir, PathBuf::from("videos"));
        assert_eq!(config.paths.temp_dir, PathBuf::from("temp"));
        assert_eq!(config.pipeline.segment_threshold_secs, 4.5);
        assert_eq!(config.pipeline.fps, 24);
    }

    #[test]
    fn test_cli_parses_render_flags() {
        let cli = Cli::parse_from([
            "storyreel",
            "-v",
            "render",
            "projects.json",
            "--zoom",
            "1.3",
            "--placeholders",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Render {
                input,
                overrides,
                placeholders,
                ..
            } => {
                assert_eq!(input, PathBuf::from("projects.json"));
                assert_eq!(overrides.zoom, Some(1.3));
                assert!(placeholders);
            }
            _ => panic!("expected render"),
        }
    }
}
