pub mod check;
pub mod plan;
pub mod render;
pub mod validate;

use storyreel_assets::{ImageProvider, ManifestImageProvider, PlaceholderImageProvider};
use storyreel_common::config::AppConfig;
use storyreel_project_model::FrameSize;

/// File the manifest provider records image requests in.
pub const IMAGE_MANIFEST_FILE: &str = "image_prompts.json";

/// Placeholder frames when asked, otherwise a prompt manifest in the output directory.
fn image_provider(config: &AppConfig, placeholders: bool) -> Box<dyn ImageProvider> {
    if placeholders {
        Box::new(PlaceholderImageProvider::new(FrameSize::new(
            config.pipeline.frame_width,
            config.pipeline.frame_height,
        )))
    } else {
        Box::new(ManifestImageProvider::new(
            config.paths.output_dir.join(IMAGE_MANIFEST_FILE),
        ))
    }
}
