//! Image provisioning.
//!
//! Providers are fire-and-forget: they are asked for a still at a path and
//! may or may not put one there. The pipeline checks the path afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_project_model::FrameSize;
use tokio::sync::Mutex;

/// A request for one segment's still image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    /// Project the segment belongs to.
    pub project: String,

    /// Segment index within the project.
    pub segment_index: usize,

    /// Text prompt describing the image.
    pub prompt: String,

    /// Where the image is expected to appear.
    pub path: PathBuf,
}

/// Image generation capability.
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    /// Ask for an image at `request.path`. Success does not imply the file exists.
    async fn generate(&self, request: &ImageRequest) -> ReelResult<()>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// One line of the image prompt manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePromptEntry {
    pub project: String,
    pub segment_index: usize,
    pub prompt: String,
    pub output_path: PathBuf,
    pub requested_at: String,
}

/// Records every request in a JSON manifest for an external generator.
///
/// The manifest is rewritten after each request so it is usable even if the
/// run stops part way.
#[derive(Debug)]
pub struct ManifestImageProvider {
    manifest_path: PathBuf,
    entries: Mutex<Vec<ImagePromptEntry>>,
}

impl ManifestImageProvider {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Snapshot of the recorded requests.
    pub async fn entries(&self) -> Vec<ImagePromptEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ImageProvider for ManifestImageProvider {
    async fn generate(&self, request: &ImageRequest) -> ReelResult<()> {
        let mut entries = self.entries.lock().await;
        entries.push(ImagePromptEntry {
            project: request.project.clone(),
            segment_index: request.segment_index,
            prompt: request.prompt.clone(),
            output_path: request.path.clone(),
            requested_at: chrono::Utc::now().to_rfc3339(),
        });

        if let Some(parent) = self.manifest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&*entries)?;
        tokio::fs::write(&self.manifest_path, json).await?;

        tracing::info!(
            project = %request.project,
            segment = request.segment_index,
            path = %request.path.display(),
            "Image requested"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "manifest"
    }
}

/// Fill color of placeholder stills.
pub const PLACEHOLDER_RGB: [u8; 3] = [30, 30, 30];

/// Writes a plain frame-sized PNG wherever no image exists yet.
///
/// Existing files are never overwritten.
#[derive(Debug, Clone)]
pub struct PlaceholderImageProvider {
    size: FrameSize,
}

impl PlaceholderImageProvider {
    pub fn new(size: FrameSize) -> Self {
        Self { size }
    }
}

#[async_trait::async_trait]
impl ImageProvider for PlaceholderImageProvider {
    async fn generate(&self, request: &ImageRequest) -> ReelResult<()> {
        if request.path.exists() {
            tracing::debug!(path = %request.path.display(), "Keeping existing image");
            return Ok(());
        }

        let path = request.path.clone();
        let size = self.size;
        tokio::task::spawn_blocking(move || write_placeholder(&path, size))
            .await
            .map_err(|e| ReelError::image(format!("Placeholder task failed: {e}")))??;

        tracing::info!(
            segment = request.segment_index,
            path = %request.path.display(),
            "Created placeholder image"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

fn write_placeholder(path: &Path, size: FrameSize) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let img = image::RgbImage::from_pixel(
        size.width.max(1),
        size.height.max(1),
        image::Rgb(PLACEHOLDER_RGB),
    );
    img.save(path).map_err(|e| {
        ReelError::image(format!(
            "Failed to write placeholder {}: {e}",
            path.display()
        ))
    })
}
