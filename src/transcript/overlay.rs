//! Edit overlay for word text.
//!
//! User edits never mutate the canonical transcript. They live in an
//! overlay keyed by word position, so annotations (which depend only on
//! confidence) stay valid across edits and a reload of the transcript
//! discards nothing silently.

use std::collections::HashMap;

use super::Transcript;

#[derive(Debug, Default)]
pub struct EditOverlay {
    edits: HashMap<(usize, usize), String>,
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sanitized edit for the word at the given position. Callers
    /// are expected to run the text through `sanitize::sanitize_word_edit`
    /// first; the overlay stores whatever it is given.
    pub fn set(&mut self, sentence_index: usize, word_index: usize, text: String) {
        self.edits.insert((sentence_index, word_index), text);
    }

    /// Drop the edit for a word, reverting it to the canonical text.
    pub fn clear(&mut self, sentence_index: usize, word_index: usize) {
        self.edits.remove(&(sentence_index, word_index));
    }

    pub fn get(&self, sentence_index: usize, word_index: usize) -> Option<&str> {
        self.edits.get(&(sentence_index, word_index)).map(|s| s.as_str())
    }

    /// Text to display for a word: the edited version when one exists,
    /// otherwise the canonical recognizer output.
    pub fn effective_text<'a>(
        &'a self,
        transcript: &'a Transcript,
        sentence_index: usize,
        word_index: usize,
    ) -> Option<&'a str> {
        if let Some(edited) = self.get(sentence_index, word_index) {
            return Some(edited);
        }
        transcript
            .get(sentence_index)
            .and_then(|s| s.words.get(word_index))
            .map(|w| w.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Sentence, Word};

    fn transcript() -> Transcript {
        vec![Sentence {
            start: Some(0.0),
            end: Some(1.0),
            text: "helo".to_string(),
            words: vec![Word {
                text: "helo".to_string(),
                start: Some(0.0),
                end: Some(1.0),
                confidence: 0.3,
            }],
        }]
    }

    #[test]
    fn overlay_wins_over_canonical_text() {
        let t = transcript();
        let mut overlay = EditOverlay::new();
        assert_eq!(overlay.effective_text(&t, 0, 0), Some("helo"));

        overlay.set(0, 0, "hello".to_string());
        assert_eq!(overlay.effective_text(&t, 0, 0), Some("hello"));

        // canonical transcript untouched
        assert_eq!(t[0].words[0].text, "helo");
    }

    #[test]
    fn clearing_reverts_to_canonical() {
        let t = transcript();
        let mut overlay = EditOverlay::new();
        overlay.set(0, 0, "hello".to_string());
        overlay.clear(0, 0);
        assert_eq!(overlay.effective_text(&t, 0, 0), Some("helo"));
        assert!(overlay.is_empty());
    }

    #[test]
    fn out_of_range_position_is_none() {
        let t = transcript();
        let overlay = EditOverlay::new();
        assert_eq!(overlay.effective_text(&t, 3, 0), None);
        assert_eq!(overlay.effective_text(&t, 0, 9), None);
    }
}
