//! Check system capabilities.

use storyreel_assets::ffmpeg::command_exists;
use storyreel_common::config::{config_file_path, AppConfig};

/// External tools the default collaborators shell out to.
const REQUIRED_TOOLS: [(&str, &str); 3] = [
    ("ffmpeg", "audio joining and video rendering"),
    ("ffprobe", "measuring synthesized speech"),
    ("edge-tts", "speech synthesis (pip install edge-tts)"),
];

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Storyreel System Check");
    println!("{}", "=".repeat(50));

    let mut missing = 0;
    for (tool, purpose) in REQUIRED_TOOLS {
        if command_exists(tool) {
            println!("[OK]   {tool}: {purpose}");
        } else {
            missing += 1;
            println!("[MISS] {tool}: {purpose}");
        }
    }

    println!();
    println!("Config file: {}", config_file_path().display());
    println!("  Voice: {}", config.pipeline.voice);
    println!(
        "  Frame: {}x{} @ {} fps, zoom to {:.2}x",
        config.pipeline.frame_width,
        config.pipeline.frame_height,
        config.pipeline.fps,
        config.pipeline.zoom_ratio
    );
    println!(
        "  Segment ceiling: {:.1}s",
        config.pipeline.segment_threshold_secs
    );

    println!();
    if missing == 0 {
        println!("All required tools are available. Storyreel is ready.");
    } else {
        println!("{missing} required tool(s) missing. See above.");
    }

    Ok(())
}
