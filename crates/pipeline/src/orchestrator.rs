//! Project orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use storyreel_assets::{
    AudioJoiner, EdgeTtsSynthesizer, FfmpegAudioJoiner, ImageProvider, ImageRequest,
    SpeechSynthesizer,
};
use storyreel_common::config::AppConfig;
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_processing_core::{visual_prompt, SegmentGrouper};
use storyreel_project_model::{
    load_projects, remove_dir_if_exists, OutputNames, Project, ProjectWorkspace, Segment,
    Timeline,
};
use storyreel_render_engine::{
    release_timeline, Compositor, FfmpegBackend, ProgressCallback, RenderBackend, RenderProgress,
    TimelineAssembler,
};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::report::{
    PlannedSegment, ProjectOutcome, ProjectPlan, ProjectReport, RunReport,
};

/// Receives render progress, tagged with the project name.
pub type RenderProgressSink = Arc<dyn Fn(&str, RenderProgress) + Send + Sync>;

/// The external capabilities a run depends on.
pub struct Collaborators {
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    pub images: Box<dyn ImageProvider>,
    pub joiner: Box<dyn AudioJoiner>,
    pub backend: Box<dyn RenderBackend>,
}

impl Collaborators {
    /// edge-tts speech and ffmpeg joining/rendering, with the given image source.
    pub fn system(images: Box<dyn ImageProvider>) -> Self {
        Self {
            synthesizer: Box::new(EdgeTtsSynthesizer::new()),
            images,
            joiner: Box::new(FfmpegAudioJoiner::new()),
            backend: Box::new(FfmpegBackend::new()),
        }
    }
}

/// Load the input document, mapping load failures into [`ReelError`].
pub fn read_input(path: &Path) -> ReelResult<Vec<Project>> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    load_projects(path).map_err(|e| ReelError::project(e.to_string()))
}

/// Runs projects through split, synthesis, grouping, compositing and assembly.
pub struct Orchestrator {
    config: AppConfig,
    synthesizer: Box<dyn SpeechSynthesizer>,
    images: Box<dyn ImageProvider>,
    joiner: Box<dyn AudioJoiner>,
    backend: Arc<Mutex<Box<dyn RenderBackend>>>,
    progress: Option<RenderProgressSink>,
}

impl Orchestrator {
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            synthesizer: collaborators.synthesizer,
            images: collaborators.images,
            joiner: collaborators.joiner,
            backend: Arc::new(Mutex::new(collaborators.backend)),
            progress: None,
        }
    }

    pub fn with_progress(mut self, sink: RenderProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Render every project in input order.
    ///
    /// Never fails as a whole: each project's error is recorded in its
    /// report and the next project starts. The temp root is removed at the
    /// end whatever the outcomes were.
    pub async fn run(&mut self, projects: &[Project]) -> RunReport {
        let temp_root = self.config.paths.temp_dir.clone();
        let backend_name = self.backend.lock().await.name().to_string();
        tracing::info!(
            projects = projects.len(),
            temp_dir = %temp_root.display(),
            output_dir = %self.config.paths.output_dir.display(),
            synthesizer = self.synthesizer.name(),
            images = self.images.name(),
            backend = %backend_name,
            "Starting run"
        );

        let mut report = RunReport::default();
        let mut outputs = OutputNames::new(&self.config.paths.output_dir);
        for (ordinal, project) in projects.iter().enumerate() {
            let span = tracing::info_span!("project", project = %project.name, ordinal);
            let output_path = outputs.claim(project);
            let outcome = match self
                .render_project(ordinal, project, output_path)
                .instrument(span.clone())
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    span.in_scope(|| tracing::error!(error = %e, "Project failed"));
                    ProjectOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            report.projects.push(ProjectReport {
                name: project.name.clone(),
                outcome,
            });
        }

        if let Err(e) = remove_dir_if_exists(&temp_root) {
            tracing::warn!(error = %e, path = %temp_root.display(), "Failed to remove temp directory");
        }

        tracing::info!(
            rendered = report.rendered().count(),
            failed = report.failed().count(),
            "Run finished"
        );
        report
    }

    async fn render_project(
        &self,
        ordinal: usize,
        project: &Project,
        output_path: PathBuf,
    ) -> ReelResult<ProjectOutcome> {
        let workspace =
            ProjectWorkspace::for_project(&self.config.paths.temp_dir, ordinal, project);
        workspace.create()?;

        let sentences = project.sentences();
        tracing::info!(
            sentences = sentences.len(),
            workspace = %workspace.root().display(),
            "Project started"
        );

        let segments = SegmentGrouper::new(
            &self.config.pipeline,
            self.synthesizer.as_ref(),
            self.joiner.as_ref(),
        )
        .group(sentences, &workspace)
        .await?;

        if segments.is_empty() {
            tracing::warn!("Script has no sentences, nothing to render");
            discard_workspace(&workspace);
            return Ok(ProjectOutcome::Empty);
        }

        let total_segments = segments.len();
        let timeline = self.composite(project, segments, &workspace).await?;
        let skipped = total_segments - timeline.len();

        let assembler = TimelineAssembler::new(&self.config.pipeline, &self.config.encode);
        let progress = self.progress.as_ref().map(|sink| {
            let sink = Arc::clone(sink);
            let name = project.name.clone();
            Box::new(move |p: RenderProgress| sink(&name, p)) as ProgressCallback
        });

        // ffmpeg blocks; render on the blocking pool.
        let backend = Arc::clone(&self.backend);
        let rendered = tokio::task::spawn_blocking(move || {
            let mut backend = backend.blocking_lock();
            assembler.assemble(timeline, &output_path, &mut **backend, progress)
        })
        .await
        .map_err(|e| ReelError::render(format!("Render task failed: {e}")))??;

        discard_workspace(&workspace);

        Ok(match rendered {
            Some(video) => {
                tracing::info!(
                    path = %video.path.display(),
                    duration_secs = video.duration_secs,
                    segments = video.clips,
                    skipped,
                    "Project rendered"
                );
                ProjectOutcome::Rendered {
                    path: video.path,
                    duration_secs: video.duration_secs,
                    segments: video.clips,
                    skipped,
                }
            }
            None => {
                tracing::warn!(skipped, "Every segment was dropped, no video written");
                ProjectOutcome::Empty
            }
        })
    }

    /// Request an image for each segment and fit whatever appears.
    async fn composite(
        &self,
        project: &Project,
        segments: Vec<Segment>,
        workspace: &ProjectWorkspace,
    ) -> ReelResult<Timeline> {
        let compositor = Compositor::new(&self.config.pipeline);
        let mut timeline = Timeline::new();

        for segment in segments {
            let image_path = workspace.image_path(segment.index);
            self.request_image(project, &segment, &image_path).await;

            match compositor.composite(segment, &image_path) {
                Ok(Some(clip)) => timeline.push(clip),
                Ok(None) => {}
                Err(e) => {
                    release_timeline(timeline);
                    return Err(e);
                }
            }
        }

        Ok(timeline)
    }

    async fn request_image(&self, project: &Project, segment: &Segment, path: &Path) {
        let request = ImageRequest {
            project: project.name.clone(),
            segment_index: segment.index,
            prompt: visual_prompt(&segment.combined_text),
            path: path.to_path_buf(),
        };
        if let Err(e) = self.images.generate(&request).await {
            tracing::warn!(
                segment = segment.index,
                provider = self.images.name(),
                error = %e,
                "Image request failed"
            );
        }
    }

    /// Synthesize and group every project without rendering.
    ///
    /// Images are requested and each project's segment plan is written to
    /// its workspace. Workspaces are kept so images can be dropped in before
    /// a real run; segment audio is deleted.
    pub async fn plan(&self, projects: &[Project]) -> ReelResult<Vec<ProjectPlan>> {
        let mut plans = Vec::with_capacity(projects.len());
        for (ordinal, project) in projects.iter().enumerate() {
            let span = tracing::info_span!("plan", project = %project.name, ordinal);
            let plan = self.plan_project(ordinal, project).instrument(span).await?;
            plans.push(plan);
        }
        Ok(plans)
    }

    async fn plan_project(&self, ordinal: usize, project: &Project) -> ReelResult<ProjectPlan> {
        let workspace =
            ProjectWorkspace::for_project(&self.config.paths.temp_dir, ordinal, project);
        workspace.create()?;

        let segments = SegmentGrouper::new(
            &self.config.pipeline,
            self.synthesizer.as_ref(),
            self.joiner.as_ref(),
        )
        .group(project.sentences(), &workspace)
        .await?;

        let mut planned = Vec::with_capacity(segments.len());
        for segment in segments {
            let image_path = workspace.image_path(segment.index);
            self.request_image(project, &segment, &image_path).await;

            planned.push(PlannedSegment {
                index: segment.index,
                prompt: visual_prompt(&segment.combined_text),
                text: segment.combined_text,
                duration_secs: segment.audio.duration_secs,
                image_present: image_path.exists(),
                image_path,
            });

            let audio_path = segment.audio.path.clone();
            if let Err(e) = segment.audio.release() {
                tracing::warn!(error = %e, path = %audio_path.display(), "Failed to delete segment audio");
            }
        }

        let plan = ProjectPlan {
            name: project.name.clone(),
            workspace: workspace.root().to_path_buf(),
            segments: planned,
        };
        let manifest = workspace.segment_manifest_path();
        tokio::fs::write(&manifest, serde_json::to_string_pretty(&plan)?).await?;

        tracing::info!(
            segments = plan.segments.len(),
            duration_secs = plan.duration_secs(),
            manifest = %manifest.display(),
            "Project planned"
        );
        Ok(plan)
    }
}

fn discard_workspace(workspace: &ProjectWorkspace) {
    if let Err(e) = workspace.remove() {
        tracing::warn!(error = %e, path = %workspace.root().display(), "Failed to remove project workspace");
    }
}
