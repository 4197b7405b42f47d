//! Speech synthesis.

use std::path::{Path, PathBuf};

use storyreel_common::error::{ReelError, ReelResult};

use crate::ffmpeg::{probe_duration_secs, stderr_tail};

/// Audio produced for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    /// Where the audio was written.
    pub path: PathBuf,

    /// Spoken duration, known only once synthesis finished.
    pub duration_secs: f64,
}

/// Text-to-speech capability.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice` into `output`.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> ReelResult<SynthesizedSpeech>;

    /// Synthesizer name for logs.
    fn name(&self) -> &str;
}

/// Synthesizer backed by the `edge-tts` command-line tool.
#[derive(Debug, Clone)]
pub struct EdgeTtsSynthesizer {
    binary: String,
}

impl EdgeTtsSynthesizer {
    pub fn new() -> Self {
        Self {
            binary: "edge-tts".to_string(),
        }
    }

    /// Use a different executable (for example a virtualenv path).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        crate::ffmpeg::command_exists(&self.binary)
    }
}

impl Default for EdgeTtsSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> ReelResult<SynthesizedSpeech> {
        tracing::debug!(voice, chars = text.len(), path = %output.display(), "Synthesizing speech");

        let result = tokio::process::Command::new(&self.binary)
            .arg("--voice")
            .arg(voice)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(output)
            .output()
            .await
            .map_err(|e| ReelError::synthesis(format!("Failed to start {}: {e}", self.binary)))?;

        if !result.status.success() {
            return Err(ReelError::synthesis(format!(
                "{} failed (status {}): {}",
                self.binary,
                result.status,
                stderr_tail(&result.stderr)
            )));
        }

        if !output.exists() {
            return Err(ReelError::synthesis(format!(
                "{} reported success but wrote no audio at {}",
                self.binary,
                output.display()
            )));
        }

        let duration_secs = probe_duration_secs(output)
            .await
            .map_err(|e| ReelError::synthesis(format!("Could not measure synthesized audio: {e}")))?;

        Ok(SynthesizedSpeech {
            path: output.to_path_buf(),
            duration_secs,
        })
    }

    fn name(&self) -> &str {
        "edge-tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = EdgeTtsSynthesizer::with_binary("storyreel-missing-tts-binary");
        assert!(!synth.is_available());

        let err = synth
            .synthesize("Hello", "en-US-ChristopherNeural", &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Synthesis { .. }));
    }
}
