//! Transient storage layout.
//!
//! Every project gets its own working directory under the run's temp root:
//!
//! ```text
//! <temp>/
//! └── 00_<project>/
//!     ├── sentence_<i>.mp3   per-sentence speech (deleted once grouped)
//!     ├── segment_<k>.mp3    per-segment speech (deleted after render)
//!     ├── segment_<k>.txt    concat list used while joining
//!     ├── img_<k>.png        per-segment still image
//!     └── segments.json      segment plan (dry runs only)
//! ```
//!
//! The ordinal prefix keeps two projects with the same name apart.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::project::Project;

/// Working directory of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWorkspace {
    root: PathBuf,
}

impl ProjectWorkspace {
    /// Workspace for the `ordinal`-th project of a run.
    pub fn for_project(temp_root: impl AsRef<Path>, ordinal: usize, project: &Project) -> Self {
        Self {
            root: temp_root
                .as_ref()
                .join(format!("{ordinal:02}_{}", project.file_stem())),
        }
    }

    /// Wrap an existing directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if needed. Existing contents (for example
    /// pre-generated images) are left alone.
    pub fn create(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    pub fn sentence_audio_path(&self, sentence_index: usize) -> PathBuf {
        self.root.join(format!("sentence_{sentence_index}.mp3"))
    }

    pub fn segment_audio_path(&self, segment_index: usize) -> PathBuf {
        self.root.join(format!("segment_{segment_index}.mp3"))
    }

    /// Segment plan written by a dry run.
    pub fn segment_manifest_path(&self) -> PathBuf {
        self.root.join("segments.json")
    }

    /// Deterministic image location for a segment.
    pub fn image_path(&self, segment_index: usize) -> PathBuf {
        self.root.join(format!("img_{segment_index}.png"))
    }

    /// Remove the directory and everything in it.
    pub fn remove(&self) -> std::io::Result<()> {
        remove_dir_if_exists(&self.root)
    }
}

/// Hands out output paths for one run, so projects whose names sanitize to
/// the same stem still get distinct files.
///
/// The first claim of a stem gets `<stem>.mp4`; later claims get
/// `<stem>_1.mp4`, `<stem>_2.mp4` and so on.
#[derive(Debug, Clone)]
pub struct OutputNames {
    output_dir: PathBuf,
    claimed: HashSet<String>,
}

impl OutputNames {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            claimed: HashSet::new(),
        }
    }

    /// Reserve an output path for `project`.
    pub fn claim(&mut self, project: &Project) -> PathBuf {
        let stem = project.file_stem();
        let mut candidate = stem.clone();
        let mut suffix = 0;
        while !self.claimed.insert(candidate.clone()) {
            suffix += 1;
            candidate = format!("{stem}_{suffix}");
        }
        self.output_dir.join(format!("{candidate}.mp4"))
    }
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
