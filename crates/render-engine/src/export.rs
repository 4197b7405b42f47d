//! Timeline assembly and rendering.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use storyreel_assets::ffmpeg::{command_exists, stderr_tail};
use storyreel_common::config::{EncodeConfig, PipelineConfig};
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_project_model::{Clip, FrameSize, Timeline};

use crate::compositor::{clip_frame_count, compute_compositions};

/// A timeline ready to be rendered.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Clips in segment order.
    pub timeline: Timeline,

    /// Output file path.
    pub output_path: PathBuf,

    /// Output frame size.
    pub frame: FrameSize,

    /// Output frame rate.
    pub fps: u32,

    /// Encoding profile.
    pub encode: EncodeConfig,
}

impl RenderJob {
    pub fn total_frames(&self) -> u64 {
        self.timeline
            .clips()
            .iter()
            .map(|clip| clip_frame_count(clip.duration_secs(), self.fps))
            .sum()
    }
}

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
}

/// Something that can turn a [`RenderJob`] into a video file.
pub trait RenderBackend: Send {
    /// Execute the job, writing `job.output_path`.
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> ReelResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// A finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub clips: usize,
}

/// Concatenates ordered clips into one program and renders it.
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    frame: FrameSize,
    fps: u32,
    encode: EncodeConfig,
}

impl TimelineAssembler {
    pub fn new(pipeline: &PipelineConfig, encode: &EncodeConfig) -> Self {
        Self {
            frame: FrameSize::new(pipeline.frame_width, pipeline.frame_height),
            fps: pipeline.fps,
            encode: encode.clone(),
        }
    }

    /// Render `timeline` to `output_path`.
    ///
    /// An empty timeline renders nothing and returns `Ok(None)`. Every clip's
    /// audio is released once the backend returns, whether it succeeded or not.
    pub fn assemble(
        &self,
        timeline: Timeline,
        output_path: &Path,
        backend: &mut dyn RenderBackend,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<Option<RenderedVideo>> {
        if timeline.is_empty() {
            tracing::info!(output = %output_path.display(), "No clips to assemble, skipping render");
            return Ok(None);
        }

        let job = RenderJob {
            timeline,
            output_path: output_path.to_path_buf(),
            frame: self.frame,
            fps: self.fps,
            encode: self.encode.clone(),
        };

        tracing::info!(
            output = %job.output_path.display(),
            clips = job.timeline.len(),
            duration_secs = job.timeline.total_duration_secs(),
            backend = backend.name(),
            "Starting render"
        );

        let result = self.render_job(&job, backend, progress);

        let clips = job.timeline.len();
        let duration_secs = job.timeline.total_duration_secs();
        release_timeline(job.timeline);

        result?;
        Ok(Some(RenderedVideo {
            path: job.output_path,
            duration_secs,
            clips,
        }))
    }

    fn render_job(
        &self,
        job: &RenderJob,
        backend: &mut dyn RenderBackend,
        progress: Option<ProgressCallback>,
    ) -> ReelResult<()> {
        if let Some(parent) = job.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let started = std::time::Instant::now();
        backend.render(job, progress)?;

        if job.encode.debug_reports {
            if let Err(err) = write_verification_report(job) {
                tracing::warn!(error = %err, "Failed to write verification report");
            }
        }

        tracing::info!(
            output = %job.output_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Render finished"
        );
        Ok(())
    }
}

/// Delete every clip's audio file. Failures are logged.
pub fn release_timeline(timeline: Timeline) {
    for clip in timeline.into_clips() {
        let path = clip.audio.path.clone();
        if let Err(e) = clip.audio.release() {
            tracing::warn!(error = %e, path = %path.display(), "Failed to delete segment audio");
        }
    }
}

fn write_verification_report(job: &RenderJob) -> ReelResult<PathBuf> {
    let compositions = compute_compositions(&job.timeline, job.fps);
    let uncovered = compositions
        .iter()
        .filter(|comp| !comp.covers(job.frame))
        .count();

    let clips: Vec<_> = job
        .timeline
        .clips()
        .iter()
        .zip(job.timeline.clip_offsets())
        .map(|(clip, offset)| {
            serde_json::json!({
                "segment": clip.segment_index,
                "start_secs": offset,
                "duration_secs": clip.duration_secs(),
                "zoom_start": clip.zoom_start(),
                "zoom_end": clip.zoom_end(),
                "image": clip.image,
            })
        })
        .collect();

    let report_path = job.output_path.with_extension("verification.json");
    let report = serde_json::json!({
        "output": job.output_path,
        "frames": compositions.len(),
        "uncovered_frames": uncovered,
        "clips": clips,
        "status": if uncovered == 0 { "ok" } else { "warn" }
    });
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;

    if uncovered > 0 {
        tracing::warn!(uncovered, "Verification found frames the image does not cover");
    }
    tracing::info!(report = %report_path.display(), "Wrote verification report");
    Ok(report_path)
}

#[derive(Debug, Clone)]
struct RenderPlan {
    ffmpeg_args: Vec<String>,
    total_frames: u64,
    expected_duration_secs: f64,
    debug_report: String,
}

/// Renders with the `ffmpeg` command-line tool.
///
/// Each clip contributes a looped still input and its audio input; one
/// filter graph zooms every still, fits each audio stream to its clip and
/// concatenates the pairs in order.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }

    fn build_plan(&self, job: &RenderJob) -> ReelResult<RenderPlan> {
        let clips = job.timeline.clips();
        if let Some(clip) = clips.iter().find(|clip| clip.duration_secs() <= 0.0) {
            return Err(ReelError::render(format!(
                "Segment {} has no audio duration",
                clip.segment_index
            )));
        }

        let fps = job.fps.max(1);
        let total_frames = job.total_frames();
        let expected_duration_secs = job.timeline.total_duration_secs();

        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
        ];

        for clip in clips {
            args.push("-framerate".to_string());
            args.push(fps.to_string());
            args.push("-loop".to_string());
            args.push("1".to_string());
            args.push("-t".to_string());
            args.push(format!("{:.6}", clip.duration_secs()));
            args.push("-i".to_string());
            args.push(clip.image.display().to_string());
            args.push("-i".to_string());
            args.push(clip.audio.path.display().to_string());
        }

        let filter = build_filter_graph(clips, job.frame, fps, job.encode.audio_sample_rate);
        let filter_len = filter.len();

        args.push("-filter_complex".to_string());
        args.push(filter);
        args.push("-map".to_string());
        args.push("[vout]".to_string());
        args.push("-map".to_string());
        args.push("[aout]".to_string());
        args.push("-r".to_string());
        args.push(fps.to_string());

        args.append(&mut codec_args(&job.encode));

        args.push("-t".to_string());
        args.push(format!("{expected_duration_secs:.6}"));
        args.push(job.output_path.display().to_string());

        let debug_report = format!(
            "duration_secs={:.3}\nframes={}\nclips={}\nframe={}x{}\nfps={}\nfilter_len={}\nffmpeg_args={}\n",
            expected_duration_secs,
            total_frames,
            clips.len(),
            job.frame.width,
            job.frame.height,
            fps,
            filter_len,
            args.join(" "),
        );

        tracing::info!(
            duration_secs = expected_duration_secs,
            frames = total_frames,
            clips = clips.len(),
            filter_len,
            "Render plan built"
        );

        Ok(RenderPlan {
            ffmpeg_args: args,
            total_frames,
            expected_duration_secs,
            debug_report,
        })
    }

    fn run_ffmpeg(&self, plan: &RenderPlan, progress: Option<ProgressCallback>) -> ReelResult<()> {
        tracing::debug!(args = ?plan.ffmpeg_args, "Running ffmpeg");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&plan.ffmpeg_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::render(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::render("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe is full.
        let stderr_task = std::thread::spawn(move || -> Vec<u8> {
            let mut buf = Vec::new();
            if let Err(err) = BufReader::new(stderr).read_to_end(&mut buf) {
                buf.extend_from_slice(format!("<failed to read ffmpeg stderr: {err}>").as_bytes());
            }
            buf
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();

        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| ReelError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key != "progress" {
                continue;
            }

            if state.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = state.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = &progress {
                cb(progress_report(
                    &state,
                    plan.total_frames,
                    plan.expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = state.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| b"<failed to join stderr reader>".to_vec());

        if !status.success() {
            return Err(ReelError::render(format!(
                "ffmpeg render failed (status {status}): {}",
                stderr_tail(&stderr_output)
            )));
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: RenderStage::Complete,
            });
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(&mut self, job: &RenderJob, progress: Option<ProgressCallback>) -> ReelResult<()> {
        let plan = self.build_plan(job)?;

        if job.encode.debug_reports {
            let debug_path = job.output_path.with_extension("ffmpeg-debug.txt");
            if let Err(err) = std::fs::write(&debug_path, &plan.debug_report) {
                tracing::warn!(error = %err, path = %debug_path.display(), "Failed to write ffmpeg debug report");
            } else {
                tracing::info!(path = %debug_path.display(), "Wrote ffmpeg debug report");
            }
        }

        if let Some(cb) = &progress {
            cb(RenderProgress {
                progress: 0.0,
                frames_rendered: 0,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: RenderStage::Preparing,
            });
        }

        self.run_ffmpeg(&plan, progress)
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Build the `-filter_complex` graph for `clips`.
///
/// Input `2i` is clip `i`'s still, input `2i + 1` its audio. Each still is
/// cover-scaled, center-cropped to `frame`, then zoomed linearly from 1.0 to
/// the clip's ratio about the center. Audio is resampled to a common format,
/// padded and cut to the clip duration so both streams end together.
pub fn build_filter_graph(clips: &[Clip], frame: FrameSize, fps: u32, sample_rate: u32) -> String {
    let mut graph = String::new();

    for (i, clip) in clips.iter().enumerate() {
        let scaled = clip.frame.scaled_even_size();
        let duration = clip.duration_secs();
        graph.push_str(&format!(
            "[{video}:v]scale={sw}:{sh}:flags=lanczos,crop={w}:{h},setsar=1,zoompan=z='min(1+{rate:.6}*on/{fps},{ratio:.6})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps},trim=duration={duration:.6},setpts=PTS-STARTPTS,format=yuv420p[v{i}];",
            video = 2 * i,
            sw = scaled.width,
            sh = scaled.height,
            w = frame.width,
            h = frame.height,
            rate = clip.zoom.rate_per_sec(),
            ratio = clip.zoom_end(),
        ));
        graph.push_str(&format!(
            "[{audio}:a]aresample={sample_rate},aformat=sample_rates={sample_rate}:channel_layouts=stereo,apad,atrim=duration={duration:.6},asetpts=PTS-STARTPTS[a{i}];",
            audio = 2 * i + 1,
        ));
    }

    for i in 0..clips.len() {
        graph.push_str(&format!("[v{i}][a{i}]"));
    }
    graph.push_str(&format!("concat=n={}:v=1:a=1[vout][aout]", clips.len()));

    graph
}

/// Encoder arguments for the configured profile.
pub fn codec_args(encode: &EncodeConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        encode.video_codec.clone(),
        "-preset".to_string(),
        encode.preset.clone(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-threads".to_string(),
        encode.threads.max(1).to_string(),
        "-c:a".to_string(),
        encode.audio_codec.clone(),
        "-ar".to_string(),
        encode.audio_sample_rate.to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Rendering
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyreel_project_model::{AudioTrack, FrameFit, Sentence, ZoomCurve};

    fn clip(index: usize, source: FrameSize, duration: f64) -> Clip {
        Clip {
            segment_index: index,
            image: PathBuf::from(format!("/tmp/ws/img_{index}.png")),
            frame: FrameFit::cover(source, FrameSize::VERTICAL_HD),
            zoom: ZoomCurve::new(1.15, duration),
            audio: AudioTrack::for_sentence(
                Sentence::new(index, "text"),
                duration,
                format!("/tmp/ws/segment_{index}.mp3"),
            ),
        }
    }

    fn job(clips: Vec<Clip>) -> RenderJob {
        RenderJob {
            timeline: Timeline::from_clips(clips),
            output_path: PathBuf::from("/tmp/out/demo.mp4"),
            frame: FrameSize::VERTICAL_HD,
            fps: 24,
            encode: EncodeConfig::default(),
        }
    }

    #[test]
    fn test_filter_graph_pairs_inputs_in_order() {
        let clips = vec![
            clip(0, FrameSize::new(1024, 1024), 4.0),
            clip(2, FrameSize::new(1920, 1080), 3.0),
        ];
        let graph = build_filter_graph(&clips, FrameSize::VERTICAL_HD, 24, 48000);

        assert!(graph.starts_with("[0:v]scale=1920:1920:flags=lanczos,crop=1080:1920"));
        assert!(graph.contains("[1:a]aresample=48000"));
        assert!(graph.contains("[2:v]scale=3414:1920"));
        assert!(graph.contains("[3:a]"));
        assert!(graph.contains("trim=duration=4.000000"));
        assert!(graph.contains("atrim=duration=3.000000"));
        assert!(graph.contains("min(1+0.037500*on/24,1.150000)"));
        assert!(graph.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[vout][aout]"));
    }

    #[test]
    fn test_plan_inputs_loop_each_still_for_its_duration() {
        let job = job(vec![
            clip(0, FrameSize::new(512, 512), 2.5),
            clip(1, FrameSize::new(512, 512), 1.0),
        ]);
        let plan = FfmpegBackend::new().build_plan(&job).unwrap();
        let args = plan.ffmpeg_args.join(" ");

        assert!(args.contains(
            "-framerate 24 -loop 1 -t 2.500000 -i /tmp/ws/img_0.png -i /tmp/ws/segment_0.mp3"
        ));
        assert!(args.contains("-t 1.000000 -i /tmp/ws/img_1.png -i /tmp/ws/segment_1.mp3"));
        assert!(args.contains("-map [vout] -map [aout] -r 24"));
        assert!(args.ends_with("-t 3.500000 /tmp/out/demo.mp4"));
        assert_eq!(plan.total_frames, 60 + 24);
        assert!((plan.expected_duration_secs - 3.5).abs() < 1e-12);
        assert!(plan.debug_report.contains("clips=2"));
    }

    #[test]
    fn test_plan_rejects_zero_length_clip() {
        let job = job(vec![clip(0, FrameSize::new(512, 512), 0.0)]);
        let err = FfmpegBackend::new().build_plan(&job).unwrap_err();
        assert!(matches!(err, ReelError::Render { .. }));
    }

    #[test]
    fn test_codec_args_follow_profile() {
        let args = codec_args(&EncodeConfig::default()).join(" ");
        assert_eq!(
            args,
            "-c:v libx264 -preset medium -pix_fmt yuv420p -threads 4 -c:a aac -ar 48000 -movflags +faststart"
        );
    }

    #[test]
    fn test_progress_state_parses_out_time() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "1500000");
        assert!((state.out_time_secs - 1.5).abs() < 1e-12);
        state.update("out_time_ms", "3000000");
        assert!((state.out_time_secs - 3.0).abs() < 1e-12);
        state.update("out_time_us", "N/A");
        assert!((state.out_time_secs - 3.0).abs() < 1e-12);
        state.update("progress", "end");
        assert!(state.complete);
    }

    #[test]
    fn test_progress_report_estimates_remaining_time() {
        let state = ProgressState {
            out_time_secs: 2.0,
            complete: false,
        };
        let report = progress_report(&state, 96, 4.0, 10.0);
        assert_eq!(report.stage, RenderStage::Rendering);
        assert!((report.progress - 0.5).abs() < 1e-12);
        assert_eq!(report.frames_rendered, 48);
        assert!((report.eta_secs - 10.0).abs() < 1e-9);

        let done = progress_report(
            &ProgressState {
                out_time_secs: 4.0,
                complete: true,
            },
            96,
            4.0,
            20.0,
        );
        assert_eq!(done.stage, RenderStage::Finalizing);
        assert_eq!(done.progress, 1.0);
    }
}
