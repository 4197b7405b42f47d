//! Render every project of an input document.

use std::path::PathBuf;
use std::sync::Arc;

use storyreel_common::config::AppConfig;
use storyreel_pipeline::{read_input, Collaborators, Orchestrator, ProjectOutcome};
use storyreel_render_engine::{RenderProgress, RenderStage};

pub async fn run(
    config: AppConfig,
    input: PathBuf,
    placeholders: bool,
    json: bool,
) -> anyhow::Result<()> {
    config.validate()?;
    let projects = read_input(&input)?;

    println!("Rendering {} project(s) from {}", projects.len(), input.display());
    println!("  Output: {}", config.paths.output_dir.display());
    println!(
        "  Frame: {}x{} @ {} fps",
        config.pipeline.frame_width, config.pipeline.frame_height, config.pipeline.fps
    );

    let collaborators = Collaborators::system(super::image_provider(&config, placeholders));
    if !collaborators.backend.is_available() {
        anyhow::bail!(
            "Render backend '{}' is not available (expected ffmpeg in PATH)",
            collaborators.backend.name()
        );
    }

    let progress = Arc::new(|name: &str, p: RenderProgress| {
        if p.stage == RenderStage::Complete {
            println!("\r  [{name}] done ({} frames)                    ", p.total_frames);
        } else {
            print!(
                "\r  [{name}] {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
                p.eta_secs,
            );
        }
    });

    let mut orchestrator = Orchestrator::new(config, collaborators).with_progress(progress);
    let report = orchestrator.run(&projects).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        for project in &report.projects {
            match &project.outcome {
                ProjectOutcome::Rendered {
                    path,
                    duration_secs,
                    segments,
                    skipped,
                } => println!(
                    "[OK]   {}: {} ({duration_secs:.1}s, {segments} segment(s), {skipped} skipped)",
                    project.name,
                    path.display()
                ),
                ProjectOutcome::Empty => println!("[SKIP] {}: nothing to render", project.name),
                ProjectOutcome::Failed { reason } => {
                    println!("[FAIL] {}: {reason}", project.name)
                }
            }
        }
    }

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} project(s) failed", report.projects.len());
    }
    Ok(())
}
