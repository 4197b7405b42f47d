//! Storyreel Assets
//!
//! The pipeline's external collaborators, expressed as injectable capabilities:
//! - **Speech:** [`SpeechSynthesizer`] turns text into an audio file and its duration
//! - **Images:** [`ImageProvider`] is asked to materialize a still at a path
//! - **Audio joining:** [`AudioJoiner`] concatenates per-sentence tracks
//!
//! Concrete implementations shell out to `edge-tts` and `ffmpeg`; tests
//! substitute their own fakes.

pub mod audio;
pub mod ffmpeg;
pub mod images;
pub mod speech;

pub use audio::{AudioJoiner, FfmpegAudioJoiner};
pub use images::{
    ImagePromptEntry, ImageProvider, ImageRequest, ManifestImageProvider, PlaceholderImageProvider,
};
pub use speech::{EdgeTtsSynthesizer, SpeechSynthesizer, SynthesizedSpeech};
