//! Run and plan results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What happened to one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectOutcome {
    /// A video was written.
    Rendered {
        path: PathBuf,
        duration_secs: f64,
        /// Segments that made it into the video.
        segments: usize,
        /// Segments dropped for lack of an image.
        skipped: usize,
    },

    /// Nothing to render: the script had no sentences or every segment was dropped.
    Empty,

    /// The project aborted; later projects still ran.
    Failed { reason: String },
}

/// Result for one project, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub name: String,
    pub outcome: ProjectOutcome,
}

/// Result of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    pub fn rendered(&self) -> impl Iterator<Item = &ProjectReport> {
        self.projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Rendered { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProjectReport> {
        self.projects
            .iter()
            .filter(|p| matches!(p.outcome, ProjectOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// One segment of a dry run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSegment {
    pub index: usize,
    pub text: String,
    pub prompt: String,
    pub duration_secs: f64,
    /// Where the renderer will look for the segment's image.
    pub image_path: PathBuf,
    pub image_present: bool,
}

/// Segment plan of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPlan {
    pub name: String,
    pub workspace: PathBuf,
    pub segments: Vec<PlannedSegment>,
}

impl ProjectPlan {
    pub fn duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ProjectOutcome::Failed {
            reason: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");

        let json = serde_json::to_value(ProjectOutcome::Empty).unwrap();
        assert_eq!(json["status"], "empty");
    }

    #[test]
    fn test_run_report_filters() {
        let report = RunReport {
            projects: vec![
                ProjectReport {
                    name: "a".to_string(),
                    outcome: ProjectOutcome::Empty,
                },
                ProjectReport {
                    name: "b".to_string(),
                    outcome: ProjectOutcome::Failed {
                        reason: "x".to_string(),
                    },
                },
                ProjectReport {
                    name: "c".to_string(),
                    outcome: ProjectOutcome::Rendered {
                        path: PathBuf::from("output/c.mp4"),
                        duration_secs: 3.0,
                        segments: 1,
                        skipped: 0,
                    },
                },
            ],
        };
        assert!(report.has_failures());
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.rendered().next().unwrap().name, "c");
    }
}
