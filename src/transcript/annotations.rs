//! Low-confidence word extraction and flagged-word navigation.
//!
//! Annotations are derived, never persisted: they reference a word by its
//! position and are recomputed from scratch whenever the transcript changes.

use serde::Serialize;

use super::Transcript;

/// Default cutoff below which a word is flagged for review.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Position of a flagged word within its transcript. Holds no copy of the
/// word and no identity beyond the index pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Annotation {
    pub sentence_index: usize,
    pub word_index: usize,
}

/// Collect every word with `confidence < threshold`, in document order
/// (sentences in order, words within a sentence in order). Pure and
/// deterministic; an empty transcript yields an empty list.
pub fn extract_low_confidence(transcript: &Transcript, threshold: f64) -> Vec<Annotation> {
    let mut flagged = Vec::new();
    for (si, sentence) in transcript.iter().enumerate() {
        for (wi, word) in sentence.words.iter().enumerate() {
            if word.confidence < threshold {
                flagged.push(Annotation {
                    sentence_index: si,
                    word_index: wi,
                });
            }
        }
    }
    flagged
}

fn annotation_start(transcript: &Transcript, annotation: &Annotation) -> Option<f64> {
    transcript
        .get(annotation.sentence_index)
        .and_then(|s| s.words.get(annotation.word_index))
        .and_then(|w| w.start)
}

/// Seek target for "next flagged word": the first annotation whose start is
/// strictly after `current_time`. None when there is no such word (a no-op
/// for the caller, not an error).
pub fn next_flagged_start(
    transcript: &Transcript,
    annotations: &[Annotation],
    current_time: f64,
) -> Option<f64> {
    annotations
        .iter()
        .filter_map(|a| annotation_start(transcript, a))
        .find(|&start| start > current_time)
}

/// Seek target for "previous flagged word": the last annotation whose start
/// is strictly before `current_time`.
pub fn prev_flagged_start(
    transcript: &Transcript,
    annotations: &[Annotation],
    current_time: f64,
) -> Option<f64> {
    annotations
        .iter()
        .filter_map(|a| annotation_start(transcript, a))
        .filter(|&start| start < current_time)
        .last()
}
