//! Audio tracks and timed segments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::script::Sentence;

/// A synthesized audio asset and the sentences it speaks.
///
/// The backing file belongs to whoever holds the track. Call
/// [`AudioTrack::release`] once the audio has been consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Sentences spoken by this track, in order.
    pub source_sentences: Vec<Sentence>,

    /// Spoken duration in seconds.
    pub duration_secs: f64,

    /// Backing audio file.
    pub path: PathBuf,
}

impl AudioTrack {
    /// Track for a single synthesized sentence.
    pub fn for_sentence(sentence: Sentence, duration_secs: f64, path: impl Into<PathBuf>) -> Self {
        Self {
            source_sentences: vec![sentence],
            duration_secs,
            path: path.into(),
        }
    }

    /// Describe the concatenation of `parts` stored at `path`.
    ///
    /// Durations add up; nothing is re-synthesized.
    pub fn concatenated(parts: &[AudioTrack], path: impl Into<PathBuf>) -> Self {
        Self {
            source_sentences: parts
                .iter()
                .flat_map(|part| part.source_sentences.iter().cloned())
                .collect(),
            duration_secs: parts.iter().map(|part| part.duration_secs).sum(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the backing file. A file that is already gone is not an error.
    pub fn release(self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::trace!(path = %self.path.display(), "Released audio track");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A contiguous run of sentences rendered as one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Zero-based segment position within the project.
    pub index: usize,

    /// Member sentences, in document order. Never empty.
    pub sentences: Vec<Sentence>,

    /// Member sentence texts joined for prompting.
    pub combined_text: String,

    /// Concatenated audio; its duration is the clip duration.
    pub audio: AudioTrack,
}

impl Segment {
    /// Build a segment from its sentences and combined audio.
    ///
    /// Returns `None` for an empty sentence run.
    pub fn new(index: usize, sentences: Vec<Sentence>, audio: AudioTrack) -> Option<Self> {
        if sentences.is_empty() {
            return None;
        }
        let combined_text = join_sentences(&sentences);
        Some(Self {
            index,
            sentences,
            combined_text,
            audio,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.audio.duration_secs
    }
}

/// Join sentence texts back into prose.
pub fn join_sentences(sentences: &[Sentence]) -> String {
    sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(". ")
}
