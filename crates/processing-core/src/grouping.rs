//! Timed segment grouping.
//!
//! Packs consecutive sentences into segments whose spoken duration stays
//! under a ceiling (default 6 seconds).
//!
//! # Algorithm
//!
//! 1. **Synthesize** each sentence in order; its duration is known only after
//!    the call returns.
//! 2. **Flush** the running group when it is non-empty and adding the next
//!    sentence would push it past the ceiling.
//! 3. **Append** the sentence otherwise.
//! 4. **Finish** by flushing whatever remains.
//!
//! A sentence that is longer than the ceiling on its own still forms its own
//! segment; sentences are never split.

use storyreel_assets::{AudioJoiner, SpeechSynthesizer};
use storyreel_common::config::PipelineConfig;
use storyreel_common::error::{ReelError, ReelResult};
use storyreel_project_model::{AudioTrack, ProjectWorkspace, Segment, Sentence};

/// A completed run of items and their summed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationGroup<T> {
    pub items: Vec<T>,
    pub duration_secs: f64,
}

/// Greedy accumulator with a duration ceiling.
#[derive(Debug, Clone)]
pub struct DurationAccumulator<T> {
    threshold_secs: f64,
    items: Vec<T>,
    accumulated_secs: f64,
}

impl<T> DurationAccumulator<T> {
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            threshold_secs,
            items: Vec::new(),
            accumulated_secs: 0.0,
        }
    }

    /// Add an item. Returns the previous group if the item did not fit.
    pub fn push(&mut self, item: T, duration_secs: f64) -> Option<DurationGroup<T>> {
        let flushed = if !self.items.is_empty()
            && self.accumulated_secs + duration_secs > self.threshold_secs
        {
            self.take()
        } else {
            None
        };

        self.items.push(item);
        self.accumulated_secs += duration_secs;
        flushed
    }

    /// Flush the remaining group, if any.
    pub fn finish(mut self) -> Option<DurationGroup<T>> {
        self.take()
    }

    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn take(&mut self) -> Option<DurationGroup<T>> {
        if self.items.is_empty() {
            return None;
        }
        let group = DurationGroup {
            items: std::mem::take(&mut self.items),
            duration_secs: self.accumulated_secs,
        };
        self.accumulated_secs = 0.0;
        Some(group)
    }
}

/// Group `(item, duration)` pairs in one pass.
pub fn group_by_duration<T>(
    items: impl IntoIterator<Item = (T, f64)>,
    threshold_secs: f64,
) -> Vec<DurationGroup<T>> {
    let mut accumulator = DurationAccumulator::new(threshold_secs);
    let mut groups = Vec::new();
    for (item, duration) in items {
        if let Some(group) = accumulator.push(item, duration) {
            groups.push(group);
        }
    }
    groups.extend(accumulator.finish());
    groups
}

/// Synthesizes sentences one at a time and folds them into segments.
pub struct SegmentGrouper<'a> {
    voice: String,
    threshold_secs: f64,
    synthesizer: &'a dyn SpeechSynthesizer,
    joiner: &'a dyn AudioJoiner,
}

impl<'a> SegmentGrouper<'a> {
    pub fn new(
        config: &PipelineConfig,
        synthesizer: &'a dyn SpeechSynthesizer,
        joiner: &'a dyn AudioJoiner,
    ) -> Self {
        Self {
            voice: config.voice.clone(),
            threshold_secs: config.segment_threshold_secs,
            synthesizer,
            joiner,
        }
    }

    /// Produce segments for `sentences`, writing audio into `workspace`.
    ///
    /// Synthesis is sequential. Per-sentence audio is deleted as soon as it
    /// has been joined into its segment's track. On error, files already
    /// written stay in the workspace.
    pub async fn group(
        &self,
        sentences: Vec<Sentence>,
        workspace: &ProjectWorkspace,
    ) -> ReelResult<Vec<Segment>> {
        let total = sentences.len();
        let mut accumulator = DurationAccumulator::new(self.threshold_secs);
        let mut segments = Vec::new();

        for sentence in sentences {
            let output = workspace.sentence_audio_path(sentence.index);
            let speech = self
                .synthesizer
                .synthesize(&sentence.text, &self.voice, &output)
                .await?;

            tracing::info!(
                sentence = sentence.index + 1,
                total,
                duration_secs = speech.duration_secs,
                text = %sentence.text,
                "Sentence synthesized"
            );

            let track = AudioTrack::for_sentence(sentence, speech.duration_secs, speech.path);
            if let Some(group) = accumulator.push(track, speech.duration_secs) {
                let segment = self.fold(segments.len(), group, workspace).await?;
                segments.push(segment);
            }
        }

        if let Some(group) = accumulator.finish() {
            let segment = self.fold(segments.len(), group, workspace).await?;
            segments.push(segment);
        }

        Ok(segments)
    }

    /// Join a group's sentence tracks into one segment track.
    async fn fold(
        &self,
        index: usize,
        group: DurationGroup<AudioTrack>,
        workspace: &ProjectWorkspace,
    ) -> ReelResult<Segment> {
        let output = workspace.segment_audio_path(index);
        let inputs: Vec<_> = group.items.iter().map(|t| t.path.clone()).collect();
        self.joiner.join(&inputs, &output).await?;

        let combined = AudioTrack::concatenated(&group.items, output);
        let sentences = combined.source_sentences.clone();

        for track in group.items {
            let path = track.path.clone();
            if let Err(e) = track.release() {
                tracing::warn!(error = %e, path = %path.display(), "Failed to delete sentence audio");
            }
        }

        tracing::info!(
            segment = index,
            sentences = sentences.len(),
            duration_secs = combined.duration_secs,
            "Segment formed"
        );

        Segment::new(index, sentences, combined)
            .ok_or_else(|| ReelError::project(format!("Segment {index} has no sentences")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn durations_of(groups: &[DurationGroup<usize>]) -> Vec<f64> {
        groups.iter().map(|g| g.duration_secs).collect()
    }

    #[test]
    fn test_flushes_when_next_item_would_exceed() {
        let groups = group_by_duration(vec![(0, 2.0), (1, 2.0), (2, 3.0)], 6.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].items, vec![0, 1]);
        assert_eq!(groups[1].items, vec![2]);
        assert_eq!(durations_of(&groups), vec![4.0, 3.0]);
    }

    #[test]
    fn test_exact_fit_stays_in_group() {
        let groups = group_by_duration(vec![(0, 3.0), (1, 3.0), (2, 0.5)], 6.0);
        assert_eq!(groups[0].items, vec![0, 1]);
        assert_eq!(groups[1].items, vec![2]);
    }

    #[test]
    fn test_oversized_single_item_forms_own_group() {
        let groups = group_by_duration(vec![(0, 9.0)], 6.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items, vec![0]);
        assert_eq!(groups[0].duration_secs, 9.0);
    }

    #[test]
    fn test_oversized_item_between_short_ones() {
        let groups = group_by_duration(vec![(0, 1.0), (1, 7.5), (2, 1.0)], 6.0);
        let items: Vec<_> = groups.iter().map(|g| g.items.clone()).collect();
        assert_eq!(items, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_no_items_no_groups() {
        let groups = group_by_duration(Vec::<(usize, f64)>::new(), 6.0);
        assert!(groups.is_empty());
        assert!(DurationAccumulator::<usize>::new(6.0).finish().is_none());
    }

    #[test]
    fn test_accumulator_tracks_running_total() {
        let mut acc = DurationAccumulator::new(6.0);
        assert!(acc.push("a", 2.5).is_none());
        assert!((acc.accumulated_secs() - 2.5).abs() < 1e-12);
        let flushed = acc.push("b", 4.0).unwrap();
        assert_eq!(flushed.items, vec!["a"]);
        assert!((acc.accumulated_secs() - 4.0).abs() < 1e-12);
        assert!(!acc.is_empty());
    }

    proptest! {
        #[test]
        fn prop_groups_respect_ceiling_unless_single(
            durations in proptest::collection::vec(0.05f64..12.0, 0..40),
            threshold in 1.0f64..10.0,
        ) {
            let groups = group_by_duration(durations.iter().copied().enumerate(), threshold);
            for group in &groups {
                prop_assert!(!group.items.is_empty());
                if group.items.len() > 1 {
                    prop_assert!(group.duration_secs <= threshold + 1e-9);
                }
                let sum: f64 = group.items.iter().map(|&i| durations[i]).sum();
                prop_assert!((sum - group.duration_secs).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_groups_preserve_order(
            durations in proptest::collection::vec(0.05f64..12.0, 0..40),
            threshold in 1.0f64..10.0,
        ) {
            let groups = group_by_duration(durations.iter().copied().enumerate(), threshold);
            let flattened: Vec<usize> = groups.into_iter().flat_map(|g| g.items).collect();
            let expected: Vec<usize> = (0..durations.len()).collect();
            prop_assert_eq!(flattened, expected);
        }

        #[test]
        fn prop_adjacent_groups_could_not_merge(
            durations in proptest::collection::vec(0.05f64..12.0, 1..40),
            threshold in 1.0f64..10.0,
        ) {
            let groups = group_by_duration(durations.iter().copied().enumerate(), threshold);
            for pair in groups.windows(2) {
                let next_first = durations[pair[1].items[0]];
                prop_assert!(pair[0].duration_secs + next_first > threshold);
            }
        }
    }
}
