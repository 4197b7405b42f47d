use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use storyreel_assets::{AudioJoiner, SpeechSynthesizer, SynthesizedSpeech};
use storyreel_common::config::PipelineConfig;
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_processing_core::SegmentGrouper;
use storyreel_project_model::{split_sentences, ProjectWorkspace};

/// Writes the sentence text as "audio" and reports a scripted duration.
struct ScriptedSynthesizer {
    durations: HashMap<String, f64>,
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    fn new(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(text, d)| (text.to_string(), *d))
                .collect(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _voice: &str,
        output: &Path,
    ) -> ReelResult<SynthesizedSpeech> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail_on.as_deref() == Some(text) {
            return Err(ReelError::synthesis("service unavailable"));
        }
        std::fs::write(output, text)?;
        Ok(SynthesizedSpeech {
            path: output.to_path_buf(),
            duration_secs: self.durations[text],
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Concatenates input bytes separated by `|`.
struct ByteJoiner;

#[async_trait::async_trait]
impl AudioJoiner for ByteJoiner {
    async fn join(&self, inputs: &[PathBuf], output: &Path) -> ReelResult<()> {
        let parts: Vec<String> = inputs
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<_, _>>()?;
        std::fs::write(output, parts.join("|"))?;
        Ok(())
    }
}

fn workspace(dir: &Path) -> ProjectWorkspace {
    let ws = ProjectWorkspace::at(dir.join("00_demo"));
    ws.create().unwrap();
    ws
}

#[tokio::test]
async fn groups_two_short_sentences_and_flushes_the_third() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path());
    let synth = ScriptedSynthesizer::new(&[("One", 2.0), ("Two", 2.0), ("Three", 3.0)]);
    let grouper = SegmentGrouper::new(&PipelineConfig::default(), &synth, &ByteJoiner);

    let segments = grouper
        .group(split_sentences("One. Two. Three."), &ws)
        .await
        .unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].index, 0);
    assert_eq!(segments[0].sentences.len(), 2);
    assert!((segments[0].duration_secs() - 4.0).abs() < 1e-12);
    assert_eq!(segments[1].index, 1);
    assert!((segments[1].duration_secs() - 3.0).abs() < 1e-12);
    assert_eq!(segments[0].combined_text, "One. Two");

    assert_eq!(
        std::fs::read_to_string(ws.segment_audio_path(0)).unwrap(),
        "One|Two"
    );
    assert_eq!(
        std::fs::read_to_string(ws.segment_audio_path(1)).unwrap(),
        "Three"
    );
    for i in 0..3 {
        assert!(!ws.sentence_audio_path(i).exists(), "sentence {i} audio kept");
    }
    assert_eq!(*synth.calls.lock().unwrap(), vec!["One", "Two", "Three"]);
}

#[tokio::test]
async fn long_sentence_forms_its_own_segment() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path());
    let synth = ScriptedSynthesizer::new(&[("A very long sentence", 9.0)]);
    let grouper = SegmentGrouper::new(&PipelineConfig::default(), &synth, &ByteJoiner);

    let segments = grouper
        .group(split_sentences("A very long sentence."), &ws)
        .await
        .unwrap();

    assert_eq!(segments.len(), 1);
    assert!((segments[0].duration_secs() - 9.0).abs() < 1e-12);
}

#[tokio::test]
async fn empty_script_yields_no_segments() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path());
    let synth = ScriptedSynthesizer::new(&[]);
    let grouper = SegmentGrouper::new(&PipelineConfig::default(), &synth, &ByteJoiner);

    let segments = grouper.group(split_sentences("  "), &ws).await.unwrap();
    assert!(segments.is_empty());
    assert!(synth.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn synthesis_failure_stops_grouping() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace(dir.path());
    let mut synth = ScriptedSynthesizer::new(&[("One", 1.0), ("Two", 1.0), ("Three", 1.0)]);
    synth.fail_on = Some("Two".to_string());
    let grouper = SegmentGrouper::new(&PipelineConfig::default(), &synth, &ByteJoiner);

    let err = grouper
        .group(split_sentences("One. Two. Three."), &ws)
        .await
        .unwrap_err();

    assert!(matches!(err, ReelError::Synthesis { .. }));
    assert_eq!(*synth.calls.lock().unwrap(), vec!["One", "Two"]);
}
