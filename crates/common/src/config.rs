//! Application configuration.
//!
//! The configuration is assembled once (file, then CLI overrides) and handed
//! to each component by reference. Nothing reads it from ambient state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output and transient storage locations.
    pub paths: PathsConfig,

    /// Segmentation and framing parameters.
    pub pipeline: PipelineConfig,

    /// Encoder profile for the final render.
    pub encode: EncodeConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Filesystem locations used by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory receiving one encoded video per project.
    pub output_dir: PathBuf,

    /// Root of the transient storage; removed at the end of every run.
    pub temp_dir: PathBuf,
}

/// Parameters of the segmentation-and-assembly pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Voice identifier passed to the speech synthesizer.
    pub voice: String,

    /// Target frame width in pixels.
    pub frame_width: u32,

    /// Target frame height in pixels.
    pub frame_height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Ceiling on the accumulated spoken duration of one segment (seconds).
    pub segment_threshold_secs: f64,

    /// Zoom factor reached at the end of each clip (1.0 = no zoom).
    pub zoom_ratio: f64,
}

/// Encoder profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// ffmpeg video encoder name.
    pub video_codec: String,

    /// ffmpeg audio encoder name.
    pub audio_codec: String,

    /// Encoder speed/quality preset.
    pub preset: String,

    /// Encoder worker threads.
    pub threads: u32,

    /// Sample rate every clip's audio is resampled to before concatenation.
    pub audio_sample_rate: u32,

    /// Write ffmpeg invocation and frame verification reports next to each output.
    pub debug_reports: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "storyreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            pipeline: PipelineConfig::default(),
            encode: EncodeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            temp_dir: PathBuf::from("temp"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            voice: "en-US-ChristopherNeural".to_string(),
            frame_width: 1080,
            frame_height: 1920,
            fps: 24,
            segment_threshold_secs: 6.0,
            zoom_ratio: 1.15,
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            threads: 4,
            audio_sample_rate: 48000,
            debug_reports: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Reject configurations the pipeline cannot honor.
    pub fn validate(&self) -> ReelResult<()> {
        self.pipeline.validate()?;
        if self.encode.threads == 0 {
            return Err(ReelError::config("encode.threads must be at least 1"));
        }
        if self.encode.audio_sample_rate == 0 {
            return Err(ReelError::config("encode.audio_sample_rate must be positive"));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Reject segmentation/framing parameters that would break timing or fit.
    pub fn validate(&self) -> ReelResult<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ReelError::config(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.fps == 0 {
            return Err(ReelError::config("fps must be at least 1"));
        }
        if !(self.segment_threshold_secs.is_finite() && self.segment_threshold_secs > 0.0) {
            return Err(ReelError::config(format!(
                "segment threshold must be a positive number of seconds, got {}",
                self.segment_threshold_secs
            )));
        }
        if !(self.zoom_ratio.is_finite() && self.zoom_ratio >= 1.0) {
            return Err(ReelError::config(format!(
                "zoom ratio must be >= 1.0, got {}",
                self.zoom_ratio
            )));
        }
        if self.voice.trim().is_empty() {
            return Err(ReelError::config("voice must not be empty"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("storyreel").join("config.json")
}
