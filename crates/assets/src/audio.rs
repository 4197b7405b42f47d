//! Audio concatenation.

use std::path::{Path, PathBuf};

use storyreel_common::error::{ReelError, ReelResult};

use crate::ffmpeg::{concat_list_entry, stderr_tail};

/// Joins several audio files into one, in order.
///
/// Inputs are left in place; the caller releases them.
#[async_trait::async_trait]
pub trait AudioJoiner: Send + Sync {
    async fn join(&self, inputs: &[PathBuf], output: &Path) -> ReelResult<()>;
}

/// Joiner using the ffmpeg concat demuxer.
#[derive(Debug, Clone, Default)]
pub struct FfmpegAudioJoiner;

impl FfmpegAudioJoiner {
    pub fn new() -> Self {
        Self
    }
}

/// Render the concat demuxer list for `inputs`.
pub fn build_concat_list(inputs: &[PathBuf]) -> String {
    let mut list = String::new();
    for input in inputs {
        list.push_str(&concat_list_entry(input));
        list.push('\n');
    }
    list
}

#[async_trait::async_trait]
impl AudioJoiner for FfmpegAudioJoiner {
    async fn join(&self, inputs: &[PathBuf], output: &Path) -> ReelResult<()> {
        match inputs {
            [] => Err(ReelError::audio("Nothing to join")),
            [single] => {
                tokio::fs::copy(single, output).await.map_err(|e| {
                    ReelError::audio(format!(
                        "Failed to copy {} to {}: {e}",
                        single.display(),
                        output.display()
                    ))
                })?;
                Ok(())
            }
            many => {
                let mut absolute = Vec::with_capacity(many.len());
                for input in many {
                    let path = tokio::fs::canonicalize(input).await.map_err(|e| {
                        ReelError::audio(format!("Missing audio part {}: {e}", input.display()))
                    })?;
                    absolute.push(path);
                }

                let list_path = output.with_extension("txt");
                tokio::fs::write(&list_path, build_concat_list(&absolute)).await?;

                tracing::debug!(parts = many.len(), output = %output.display(), "Joining audio");
                let result = tokio::process::Command::new("ffmpeg")
                    .args(["-y", "-hide_banner", "-loglevel", "error"])
                    .args(["-f", "concat", "-safe", "0", "-i"])
                    .arg(&list_path)
                    .args(["-c:a", "libmp3lame", "-q:a", "2"])
                    .arg(output)
                    .output()
                    .await;

                if let Err(e) = tokio::fs::remove_file(&list_path).await {
                    tracing::warn!(error = %e, path = %list_path.display(), "Failed to remove concat list");
                }

                let result =
                    result.map_err(|e| ReelError::audio(format!("Failed to start ffmpeg: {e}")))?;
                if !result.status.success() {
                    return Err(ReelError::audio(format!(
                        "ffmpeg audio concat failed (status {}): {}",
                        result.status,
                        stderr_tail(&result.stderr)
                    )));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_concat_list_keeps_order() {
        let list = build_concat_list(&[
            PathBuf::from("/w/sentence_0.mp3"),
            PathBuf::from("/w/sentence_1.mp3"),
        ]);
        assert_eq!(
            list,
            "file '/w/sentence_0.mp3'\nfile '/w/sentence_1.mp3'\n"
        );
    }

    #[tokio::test]
    async fn test_single_input_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sentence_0.mp3");
        let output = dir.path().join("segment_0.mp3");
        std::fs::write(&input, b"ID3 audio").unwrap();

        FfmpegAudioJoiner::new()
            .join(&[input.clone()], &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"ID3 audio");
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_empty_join_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FfmpegAudioJoiner::new()
            .join(&[], &dir.path().join("segment_0.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Audio { .. }));
    }
}
