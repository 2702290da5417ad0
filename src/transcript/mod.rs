//! Transcript data model.
//!
//! A transcript is an ordered list of sentences, each carrying word-level
//! timestamps and a recognizer confidence per word. The order is temporal
//! and is preserved through every transformation; nothing in this module
//! mutates a transcript after parsing.

pub mod annotations;
pub mod overlay;
pub mod payload;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One recognized word. `start`/`end` are seconds from the beginning of the
/// audio; they may be absent when the recognizer could not place the word.
/// `confidence` is a probability in [0, 1] assigned by the recognizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub confidence: f64,
}

/// One sentence with its word breakdown. `text` mirrors the concatenated
/// words as the recognizer produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub start: Option<f64>,
    pub end: Option<f64>,
    #[serde(rename = "sentence")]
    pub text: String,
    pub words: Vec<Word>,
}

pub type Transcript = Vec<Sentence>;

/// Parse a backend transcript payload (the inner JSON of a `whisper-done`
/// event, or a transcript file read back from disk).
///
/// Fails with `MalformedTranscript` when the payload is not an array, a
/// sentence lacks its `words` field, or a confidence is not a finite number
/// in [0, 1]. Out-of-range confidences are a data error, never clamped.
pub fn parse_transcript(raw: &str) -> Result<Transcript, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| AppError::MalformedTranscript(format!("not valid JSON: {}", e)))?;

    if !value.is_array() {
        return Err(AppError::MalformedTranscript(
            "payload is not an array of sentences".to_string(),
        ));
    }

    let transcript: Transcript = serde_json::from_value(value)
        .map_err(|e| AppError::MalformedTranscript(e.to_string()))?;

    validate_transcript(&transcript)?;
    Ok(transcript)
}

fn validate_transcript(transcript: &Transcript) -> Result<(), AppError> {
    for (si, sentence) in transcript.iter().enumerate() {
        if let (Some(start), Some(end)) = (sentence.start, sentence.end) {
            if start > end {
                return Err(AppError::MalformedTranscript(format!(
                    "sentence {} has start {} after end {}",
                    si, start, end
                )));
            }
        }
        for (wi, word) in sentence.words.iter().enumerate() {
            if !word.confidence.is_finite() {
                return Err(AppError::MalformedTranscript(format!(
                    "word {}.{} has non-finite confidence",
                    si, wi
                )));
            }
            if !(0.0..=1.0).contains(&word.confidence) {
                return Err(AppError::MalformedTranscript(format!(
                    "word {}.{} has confidence {} outside [0, 1]",
                    si, wi, word.confidence
                )));
            }
            if let (Some(start), Some(end)) = (word.start, word.end) {
                if start > end {
                    return Err(AppError::MalformedTranscript(format!(
                        "word {}.{} has start {} after end {}",
                        si, wi, start, end
                    )));
                }
            }
        }
    }
    Ok(())
}
