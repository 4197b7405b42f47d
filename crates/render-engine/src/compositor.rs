//! Frame compositor: fits a segment's still into the target frame.
//!
//! Produces one [`Clip`] per segment: cover-fit, centered, zooming linearly
//! about the frame center, carrying the segment's audio. Also expands a
//! timeline into per-frame composition instructions used for verification.

use std::path::Path;

use storyreel_common::config::PipelineConfig;
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_project_model::{Clip, FrameFit, FrameSize, Segment, Timeline, ZoomCurve};

/// Builds clips against a fixed target frame.
#[derive(Debug, Clone)]
pub struct Compositor {
    target: FrameSize,
    zoom_ratio: f64,
}

impl Compositor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            target: FrameSize::new(config.frame_width, config.frame_height),
            zoom_ratio: config.zoom_ratio,
        }
    }

    pub fn target(&self) -> FrameSize {
        self.target
    }

    /// Composite `segment` with the still expected at `image_path`.
    ///
    /// A missing image drops the segment: its audio is released and
    /// `Ok(None)` is returned. An image that exists but cannot be decoded is
    /// an error.
    pub fn composite(&self, segment: Segment, image_path: &Path) -> ReelResult<Option<Clip>> {
        if !image_path.exists() {
            tracing::warn!(
                segment = segment.index,
                path = %image_path.display(),
                duration_secs = segment.duration_secs(),
                "Image not found, dropping segment"
            );
            let audio_path = segment.audio.path.clone();
            if let Err(e) = segment.audio.release() {
                tracing::warn!(error = %e, path = %audio_path.display(), "Failed to delete segment audio");
            }
            return Ok(None);
        }

        let (width, height) = image::image_dimensions(image_path).map_err(|e| {
            ReelError::image(format!(
                "Failed to read image {}: {e}",
                image_path.display()
            ))
        })?;

        let frame = FrameFit::cover(FrameSize::new(width, height), self.target);
        let zoom = ZoomCurve::new(self.zoom_ratio, segment.duration_secs());

        tracing::debug!(
            segment = segment.index,
            source_width = width,
            source_height = height,
            scale = frame.scale,
            duration_secs = segment.duration_secs(),
            "Segment composited"
        );

        Ok(Some(Clip {
            segment_index: segment.index,
            image: image_path.to_path_buf(),
            frame,
            zoom,
            audio: segment.audio,
        }))
    }
}

/// A single frame's composition instructions.
#[derive(Debug, Clone)]
pub struct FrameComposition {
    /// Frame number in the concatenated program.
    pub frame_index: u64,

    /// Program time in seconds.
    pub time_secs: f64,

    /// Segment the frame belongs to.
    pub segment_index: usize,

    /// Zoom factor on top of the cover-fit scale.
    pub zoom: f64,

    /// Displayed image size in output pixels.
    pub width: f64,
    pub height: f64,

    /// Top-left of the displayed image relative to the frame.
    pub x: f64,
    pub y: f64,
}

impl FrameComposition {
    /// Whether the displayed image covers the `target` frame.
    pub fn covers(&self, target: FrameSize) -> bool {
        let tolerance = 1e-6;
        self.x <= tolerance
            && self.y <= tolerance
            && self.x + self.width + tolerance >= target.width as f64
            && self.y + self.height + tolerance >= target.height as f64
    }
}

/// Compute the composition for each frame of the timeline.
pub fn compute_compositions(timeline: &Timeline, fps: u32) -> Vec<FrameComposition> {
    let fps = fps.max(1);
    let mut compositions = Vec::new();
    let mut frame_index = 0u64;

    for (clip, offset) in timeline.clips().iter().zip(timeline.clip_offsets()) {
        let frames = clip_frame_count(clip.duration_secs(), fps);
        let (base_w, base_h) = clip.frame.scaled_size();

        for local in 0..frames {
            let local_secs = local as f64 / fps as f64;
            let zoom = clip.zoom.scale_at(local_secs);
            let (x, y) = clip.frame.offset_at_zoom(zoom);
            compositions.push(FrameComposition {
                frame_index,
                time_secs: offset + local_secs,
                segment_index: clip.segment_index,
                zoom,
                width: base_w * zoom,
                height: base_h * zoom,
                x,
                y,
            });
            frame_index += 1;
        }
    }

    compositions
}

/// Number of frames a clip of `duration_secs` occupies.
pub fn clip_frame_count(duration_secs: f64, fps: u32) -> u64 {
    (duration_secs.max(0.0) * fps.max(1) as f64).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyreel_project_model::{AudioTrack, Sentence};

    fn segment(index: usize, duration: f64, audio_path: &Path) -> Segment {
        let audio = AudioTrack::for_sentence(Sentence::new(index, "text"), duration, audio_path);
        Segment::new(index, vec![Sentence::new(index, "text")], audio).unwrap()
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_composite_fits_and_keeps_audio_duration() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img_0.png");
        write_png(&img, 64, 64);
        let audio = dir.path().join("segment_0.mp3");
        std::fs::write(&audio, b"ID3").unwrap();

        let compositor = Compositor::new(&PipelineConfig::default());
        let clip = compositor
            .composite(segment(0, 4.5, &audio), &img)
            .unwrap()
            .expect("image exists");

        assert_eq!(clip.duration_secs(), 4.5);
        assert_eq!(clip.zoom.duration_secs, 4.5);
        assert!((clip.frame.scale - 1920.0 / 64.0).abs() < 1e-9);
        assert_eq!(clip.zoom_start(), 1.0);
        assert!((clip.zoom_end() - 1.15).abs() < 1e-12);
        assert!(audio.exists());
    }

    #[test]
    fn test_missing_image_drops_segment_and_releases_audio() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("segment_1.mp3");
        std::fs::write(&audio, b"ID3").unwrap();

        let compositor = Compositor::new(&PipelineConfig::default());
        let clip = compositor
            .composite(segment(1, 3.0, &audio), &dir.path().join("img_1.png"))
            .unwrap();

        assert!(clip.is_none());
        assert!(!audio.exists());
    }

    #[test]
    fn test_corrupt_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img_0.png");
        std::fs::write(&img, b"not a png").unwrap();

        let compositor = Compositor::new(&PipelineConfig::default());
        let err = compositor
            .composite(segment(0, 1.0, &dir.path().join("a.mp3")), &img)
            .unwrap_err();
        assert!(matches!(err, ReelError::Image { .. }));
    }

    #[test]
    fn test_compositions_cover_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img_0.png");
        write_png(&img, 160, 90);

        let compositor = Compositor::new(&PipelineConfig::default());
        let a = compositor
            .composite(segment(0, 1.0, &dir.path().join("a.mp3")), &img)
            .unwrap()
            .unwrap();
        let b = compositor
            .composite(segment(1, 0.5, &dir.path().join("b.mp3")), &img)
            .unwrap()
            .unwrap();
        let timeline = Timeline::from_clips(vec![a, b]);

        let frames = compute_compositions(&timeline, 24);
        assert_eq!(frames.len(), 24 + 12);
        assert_eq!(frames[0].zoom, 1.0);
        assert_eq!(frames[24].segment_index, 1);
        assert!((frames[24].time_secs - 1.0).abs() < 1e-9);
        assert!(frames.iter().all(|f| f.covers(compositor.target())));
        assert!(frames[..24].windows(2).all(|w| w[0].zoom <= w[1].zoom));
    }

    #[test]
    fn test_clip_frame_count_rounds_up() {
        assert_eq!(clip_frame_count(1.0, 24), 24);
        assert_eq!(clip_frame_count(1.01, 24), 25);
        assert_eq!(clip_frame_count(0.0, 24), 0);
    }
}
