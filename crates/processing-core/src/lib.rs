//! Storyreel Processing Core
//!
//! Turns sentences into timed segments:
//! - **Grouping:** Greedy packing of sentences under a spoken-duration ceiling
//! - **Prompts:** Deriving an image prompt from a segment's text
//!
//! The accumulator and prompt builder are pure. [`SegmentGrouper`] drives
//! them with the speech synthesizer and audio joiner it is given.

pub mod grouping;
pub mod prompt;

pub use grouping::{group_by_duration, DurationAccumulator, DurationGroup, SegmentGrouper};
pub use prompt::visual_prompt;
