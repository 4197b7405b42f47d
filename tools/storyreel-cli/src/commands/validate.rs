//! Validate an input document.

use std::path::PathBuf;

use storyreel_common::config::AppConfig;
use storyreel_pipeline::read_input;
use storyreel_project_model::{OutputNames, ProjectWorkspace};

pub fn run(config: &AppConfig, input: PathBuf) -> anyhow::Result<()> {
    println!("Validating input at: {}", input.display());

    let projects = read_input(&input)?;
    println!("  Projects: {}", projects.len());

    let mut outputs = OutputNames::new(&config.paths.output_dir);
    let mut empty = 0;
    for (ordinal, project) in projects.iter().enumerate() {
        let sentences = project.sentences();
        if sentences.is_empty() {
            empty += 1;
        }
        println!();
        println!("  Name: {}", project.name);
        println!("  Sentences: {}", sentences.len());
        println!(
            "  Output: {}",
            outputs.claim(project).display()
        );
        println!(
            "  Workspace: {}",
            ProjectWorkspace::for_project(&config.paths.temp_dir, ordinal, project)
                .root()
                .display()
        );
    }

    println!();
    match config.validate() {
        Ok(()) => println!("Configuration is valid."),
        Err(e) => println!("Configuration issue: {e}"),
    }
    if empty == 0 {
        println!("Input is valid.");
    } else {
        println!("{empty} project(s) have no sentences and will produce no video.");
    }

    Ok(())
}
