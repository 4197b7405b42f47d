//! Storyreel Render Engine
//!
//! Turns timed segments into one encoded vertical video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! img_<k>.png ─────┐
//!                  ├── Cover-fit scale + center crop
//! segment_<k>.mp3 ─┤         │
//!                  │         ├── Linear zoom (1.0 → ratio)
//!                  │         │
//!                  └─────────┴── Clip (duration = audio duration)
//!                                   │
//!                          concat in segment order
//!                                   │
//!                                   ▼
//!                           Encode (H.264 + AAC)
//!                                   │
//!                                   ▼
//!                             <project>.mp4
//! ```

pub mod compositor;
pub mod export;

pub use compositor::Compositor;
pub use export::*;
