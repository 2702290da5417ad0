//! `whisper-done` event payload encoding and decoding.
//!
//! The wire contract is double-encoded: the event payload is a JSON string
//! whose `transcription` field is itself JSON text holding the transcript
//! array. Both directions here preserve that shape exactly: the outer
//! parse yields an object, the inner parse yields the transcript.

use serde::{Deserialize, Serialize};

use super::{parse_transcript, Transcript};
use crate::error::AppError;

/// Outer shape of a `whisper-done` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperDonePayload {
    /// JSON-encoded transcript array (requires a second parse).
    pub transcription: String,
    /// Folder where the audio and transcript were saved.
    pub project_dir: String,
    /// Full path to the transcript JSON file.
    pub json_file: String,
}

/// Result of decoding a `whisper-done` payload. Malformed payloads are
/// recovered as plain display text rather than propagated as failures.
#[derive(Debug)]
pub enum DecodedTranscription {
    Parsed {
        transcript: Transcript,
        project_dir: String,
        json_file: String,
    },
    /// Outer or inner JSON parse failed; show the raw text as-is.
    PlainText(String),
}

/// Build the double-encoded payload the frontend expects.
pub fn encode_whisper_done(
    transcript: &Transcript,
    project_dir: &str,
    json_file: &str,
) -> Result<String, AppError> {
    let inner = serde_json::to_string(transcript)
        .map_err(|e| AppError::MalformedPayload(format!("transcript encode failed: {}", e)))?;
    let payload = WhisperDonePayload {
        transcription: inner,
        project_dir: project_dir.to_string(),
        json_file: json_file.to_string(),
    };
    serde_json::to_string(&payload)
        .map_err(|e| AppError::MalformedPayload(format!("payload encode failed: {}", e)))
}

/// Decode a `whisper-done` payload, falling back to plain text on any
/// parse failure.
pub fn decode_whisper_done(raw: &str) -> DecodedTranscription {
    let payload: WhisperDonePayload = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("whisper-done outer parse failed, showing raw text: {}", e);
            return DecodedTranscription::PlainText(raw.to_string());
        }
    };

    match parse_transcript(&payload.transcription) {
        Ok(transcript) => DecodedTranscription::Parsed {
            transcript,
            project_dir: payload.project_dir,
            json_file: payload.json_file,
        },
        Err(e) => {
            log::warn!("whisper-done inner parse failed, showing raw text: {}", e);
            DecodedTranscription::PlainText(payload.transcription)
        }
    }
}
