//! Sentence splitting.
//!
//! Splits on `.`, `!` and `?` only. Abbreviations and decimals are not
//! special-cased.

use serde::{Deserialize, Serialize};

/// Characters that terminate a sentence.
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// One sentence of a script, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Zero-based position in the script.
    pub index: usize,

    /// Trimmed sentence text, without its terminator.
    pub text: String,
}

impl Sentence {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Split a script into trimmed, non-empty sentences.
///
/// Indices are assigned after empty pieces are discarded, so they are
/// contiguous from zero.
pub fn split_sentences(script: &str) -> Vec<Sentence> {
    script
        .split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(index, text)| Sentence::new(index, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_splits_on_all_terminators() {
        let sentences = split_sentences("Close your eyes. Did you salivate? Build it wisely!");
        assert_eq!(
            texts(&sentences),
            vec!["Close your eyes", "Did you salivate", "Build it wisely"]
        );
        assert_eq!(
            sentences.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_discards_empty_pieces() {
        let sentences = split_sentences("Wait... What?!  \n Go.");
        assert_eq!(texts(&sentences), vec!["Wait", "What", "Go"]);
        assert_eq!(sentences[2].index, 2);
    }

    #[test]
    fn test_empty_and_punctuation_less_inputs() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  . ! ?  ").is_empty());

        let sentences = split_sentences("  no terminator here  ");
        assert_eq!(sentences, vec![Sentence::new(0, "no terminator here")]);
    }

    #[test]
    fn test_decimals_are_not_special_cased() {
        let sentences = split_sentences("It costs 3.50 dollars.");
        assert_eq!(texts(&sentences), vec!["It costs 3", "50 dollars"]);
    }
}
