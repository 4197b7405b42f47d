//! Clips and the per-project timeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::frame::{FrameFit, ZoomCurve};
use crate::segment::AudioTrack;

/// One composited segment: a fitted still image, its zoom, and its audio.
///
/// The visible duration is the audio duration, always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Index of the segment this clip was built from.
    pub segment_index: usize,

    /// Still image shown for the clip.
    pub image: PathBuf,

    /// Cover-fit placement of the image in the target frame.
    pub frame: FrameFit,

    /// Zoom over the clip's lifetime.
    pub zoom: ZoomCurve,

    /// Combined segment audio.
    pub audio: AudioTrack,
}

impl Clip {
    /// Visible duration in seconds (equal to the audio duration).
    pub fn duration_secs(&self) -> f64 {
        self.audio.duration_secs
    }

    pub fn zoom_start(&self) -> f64 {
        self.zoom.start()
    }

    pub fn zoom_end(&self) -> f64 {
        self.zoom.end()
    }
}

/// Ordered clips of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    clips: Vec<Clip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from clips in any order; they are sorted by segment index.
    pub fn from_clips(mut clips: Vec<Clip>) -> Self {
        clips.sort_by_key(|clip| clip.segment_index);
        Self { clips }
    }

    /// Insert a clip keeping segment order.
    pub fn push(&mut self, clip: Clip) {
        let position = self
            .clips
            .partition_point(|existing| existing.segment_index <= clip.segment_index);
        self.clips.insert(position, clip);
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Sum of clip durations.
    pub fn total_duration_secs(&self) -> f64 {
        self.clips.iter().map(Clip::duration_secs).sum()
    }

    /// Start time of each clip in the concatenated program.
    pub fn clip_offsets(&self) -> Vec<f64> {
        let mut offsets = Vec::with_capacity(self.clips.len());
        let mut cursor = 0.0;
        for clip in &self.clips {
            offsets.push(cursor);
            cursor += clip.duration_secs();
        }
        offsets
    }

    /// Take ownership of the clips, leaving the timeline empty.
    pub fn into_clips(self) -> Vec<Clip> {
        self.clips
    }
}
