//! Storyreel Pipeline
//!
//! Drives every project of a run through the full flow:
//!
//! ```text
//! Project ─► split sentences ─► synthesize + group ─► request images
//!                                                          │
//!        <output>/<name>.mp4 ◄── assemble ◄── composite ◄──┘
//! ```
//!
//! Projects run one after another. A failure aborts only the project it
//! happened in. The run's temp root is removed when the run ends.

pub mod orchestrator;
pub mod report;

pub use orchestrator::{read_input, Collaborators, Orchestrator, RenderProgressSink};
pub use report::*;
