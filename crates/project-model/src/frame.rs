//! Frame geometry: cover-fit scaling and the linear zoom curve.
//!
//! The target frame is a fixed pixel size. Source images are scaled so they
//! cover it completely, centered, with the overflowing axis cropped.

use serde::{Deserialize, Serialize};

/// A frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// 9:16 vertical full HD.
    pub const VERTICAL_HD: FrameSize = FrameSize {
        width: 1080,
        height: 1920,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Placement of a source image scaled to cover a target frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameFit {
    /// Source image size.
    pub source: FrameSize,

    /// Target frame size.
    pub target: FrameSize,

    /// Uniform scale applied to the source.
    pub scale: f64,
}

impl FrameFit {
    /// Compute `scale = max(W / w, H / h)` so the scaled image covers the target.
    ///
    /// Zero-sized sources are treated as one pixel on that axis.
    pub fn cover(source: FrameSize, target: FrameSize) -> Self {
        let sw = source.width.max(1) as f64;
        let sh = source.height.max(1) as f64;
        let scale = (target.width as f64 / sw).max(target.height as f64 / sh);
        Self {
            source,
            target,
            scale,
        }
    }

    /// Exact scaled size in fractional pixels.
    pub fn scaled_size(&self) -> (f64, f64) {
        (
            self.source.width.max(1) as f64 * self.scale,
            self.source.height.max(1) as f64 * self.scale,
        )
    }

    /// Scaled size rounded up to even pixel counts (encoder friendly).
    ///
    /// Never smaller than the target on either axis.
    pub fn scaled_even_size(&self) -> FrameSize {
        let (w, h) = self.scaled_size();
        FrameSize {
            width: round_up_even(w).max(round_up_even(self.target.width as f64)),
            height: round_up_even(h).max(round_up_even(self.target.height as f64)),
        }
    }

    /// Top-left offset of the centered scaled image relative to the frame.
    ///
    /// Both components are `<= 0`: the image overhangs the frame equally on
    /// each side of the cropped axis.
    pub fn offset(&self) -> (f64, f64) {
        self.offset_at_zoom(1.0)
    }

    /// Centered offset when the scaled image is further magnified by `zoom`.
    pub fn offset_at_zoom(&self, zoom: f64) -> (f64, f64) {
        let (w, h) = self.scaled_size();
        (
            (self.target.width as f64 - w * zoom) / 2.0,
            (self.target.height as f64 - h * zoom) / 2.0,
        )
    }

    /// Whether the image, magnified by `zoom`, still covers the whole frame.
    pub fn covers_at_zoom(&self, zoom: f64) -> bool {
        let (w, h) = self.scaled_size();
        let tolerance = 1e-6;
        w * zoom + tolerance >= self.target.width as f64
            && h * zoom + tolerance >= self.target.height as f64
    }
}

fn round_up_even(value: f64) -> u32 {
    let px = value.ceil().max(2.0) as u32;
    px + (px % 2)
}

/// Linear zoom from `1.0` at `t = 0` to `ratio` at `t = duration`.
///
/// Zoom is about the frame center; there is no panning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCurve {
    /// Zoom factor at the end of the clip.
    pub ratio: f64,

    /// Clip duration in seconds.
    pub duration_secs: f64,
}

impl ZoomCurve {
    pub fn new(ratio: f64, duration_secs: f64) -> Self {
        Self {
            ratio,
            duration_secs,
        }
    }

    /// Zoom factor at the start of the clip.
    pub fn start(&self) -> f64 {
        1.0
    }

    /// Zoom factor at the end of the clip.
    pub fn end(&self) -> f64 {
        self.ratio
    }

    /// `1 + (ratio - 1) * (t / duration)`, with `t` clamped to the clip.
    pub fn scale_at(&self, t: f64) -> f64 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        let progress = (t / self.duration_secs).clamp(0.0, 1.0);
        1.0 + (self.ratio - 1.0) * progress
    }

    /// Per-second growth of the zoom factor.
    pub fn rate_per_sec(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            0.0
        } else {
            (self.ratio - 1.0) / self.duration_secs
        }
    }
}
