//! Project input records.
//!
//! A run consumes a JSON document holding an array of projects, each a
//! name plus the narration script to turn into one video.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::{split_sentences, Sentence};

/// Name used when a record omits `project_name`.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// One narration project (read-only input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Human-readable project identifier; also names the output file.
    #[serde(rename = "project_name", default = "default_project_name")]
    pub name: String,

    /// Raw narration script.
    #[serde(default)]
    pub script_text: String,
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

impl Project {
    pub fn new(name: impl Into<String>, script_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script_text: script_text.into(),
        }
    }

    /// Split the script into ordered sentences.
    pub fn sentences(&self) -> Vec<Sentence> {
        split_sentences(&self.script_text)
    }

    /// File-system safe form of the project name.
    ///
    /// Every character outside `[A-Za-z0-9_-]` becomes `_`; an empty name
    /// falls back to [`DEFAULT_PROJECT_NAME`].
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            stem
        }
    }
}

/// Errors raised while loading the input document.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Parse projects from a JSON array.
pub fn parse_projects(json: &str) -> Result<Vec<Project>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Load projects from a JSON input file.
pub fn load_projects(path: impl AsRef<Path>) -> Result<Vec<Project>, ProjectError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_projects(&content).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_projects_preserves_order() {
        let json = r#"[
            {"project_name": "01_Lemon", "script_text": "Close your eyes. Picture a lemon."},
            {"project_name": "02_Focus", "script_text": "Breathe."}
        ]"#;
        let projects = parse_projects(json).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "01_Lemon");
        assert_eq!(projects[1].script_text, "Breathe.");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let projects = parse_projects(r#"[{}]"#).unwrap();
        assert_eq!(projects[0].name, "Untitled");
        assert_eq!(projects[0].script_text, "");
        assert!(projects[0].sentences().is_empty());
    }

    #[test]
    fn test_file_stem_sanitizes() {
        let project = Project::new("My Project: v2/final", "");
        assert_eq!(project.file_stem(), "My_Project__v2_final");

        let project = Project::new("   ", "");
        assert_eq!(project.file_stem(), "Untitled");

        let project = Project::new("01_Lemon-Visualization", "");
        assert_eq!(project.file_stem(), "01_Lemon-Visualization");
    }

    #[test]
    fn test_load_projects_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input_scripts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_projects(&path).unwrap_err();
        assert!(matches!(err, ProjectError::ParseError { .. }));
        assert!(err.to_string().contains("input_scripts.json"));
    }

    #[test]
    fn test_load_projects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_projects(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ProjectError::IoError { .. }));
    }
}
