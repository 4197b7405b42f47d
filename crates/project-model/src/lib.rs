//! Storyreel Project Model
//!
//! Defines the core data contracts for narrated short videos:
//! - **Project:** The `{ project_name, script_text }` input records
//! - **Script:** Sentences split from a narration script
//! - **Segment:** Contiguous sentence runs with their combined audio track
//! - **Frame:** Cover-fit geometry and the linear zoom curve
//! - **Timeline:** Ordered clips ready for encoding
//! - **Workspace:** The per-project transient storage layout
//!
//! Data flows one way: script, sentences, segments, clips, timeline.

pub mod frame;
pub mod project;
pub mod script;
pub mod segment;
pub mod timeline;
pub mod workspace;

pub use frame::*;
pub use project::*;
pub use script::*;
pub use segment::*;
pub use timeline::*;
pub use workspace::*;
