//! Plan segments without rendering.

use std::path::PathBuf;

use storyreel_common::config::AppConfig;
use storyreel_pipeline::{read_input, Collaborators, Orchestrator};

pub async fn run(config: AppConfig, input: PathBuf, placeholders: bool) -> anyhow::Result<()> {
    config.validate()?;
    let projects = read_input(&input)?;

    let collaborators = Collaborators::system(super::image_provider(&config, placeholders));
    let orchestrator = Orchestrator::new(config, collaborators);
    let plans = orchestrator.plan(&projects).await?;

    for plan in &plans {
        println!(
            "{} ({} segment(s), {:.1}s)",
            plan.name,
            plan.segments.len(),
            plan.duration_secs()
        );
        println!("  Workspace: {}", plan.workspace.display());
        for segment in &plan.segments {
            println!(
                "  [{}] {:>5.2}s {} {}",
                segment.index,
                segment.duration_secs,
                if segment.image_present { "image  " } else { "missing" },
                segment.image_path.display()
            );
            println!("        {}", segment.text);
        }
    }

    Ok(())
}
