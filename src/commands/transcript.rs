//! Transcript session commands: payload ingestion, low-confidence
//! annotations, word edits and transcript persistence.

use std::fs;
use std::sync::Mutex;

use serde::Serialize;
use tauri::{AppHandle, Manager};

use crate::sanitize::sanitize_word_edit;
use crate::transcript::annotations::{
    extract_low_confidence, Annotation, DEFAULT_CONFIDENCE_THRESHOLD,
};
use crate::transcript::overlay::EditOverlay;
use crate::transcript::payload::{decode_whisper_done, DecodedTranscription};
use crate::transcript::{parse_transcript, Transcript};

/// Managed state for the loaded transcript. The transcript itself is a
/// read-only snapshot once ingested; annotations are derived from it and
/// recomputed on every change, and edits live in the overlay.
pub struct EditorState {
    inner: Mutex<EditorInner>,
}

struct EditorInner {
    transcript: Option<Transcript>,
    annotations: Vec<Annotation>,
    overlay: EditOverlay,
    threshold: f64,
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EditorInner {
                transcript: None,
                annotations: Vec::new(),
                overlay: EditOverlay::new(),
                threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            }),
        }
    }

    fn install(&self, transcript: Transcript) -> TranscriptSummary {
        let mut inner = self.inner.lock().unwrap();
        let threshold = inner.threshold;
        inner.annotations = extract_low_confidence(&transcript, threshold);
        inner.overlay = EditOverlay::new();
        let summary = TranscriptSummary {
            sentences: transcript.len(),
            words: transcript.iter().map(|s| s.words.len()).sum(),
            flagged: inner.annotations.len(),
        };
        inner.transcript = Some(transcript);
        summary
    }

    /// Run `f` against the loaded transcript and its annotations.
    pub fn with_annotations<T>(&self, f: impl FnOnce(&Transcript, &[Annotation]) -> T) -> Option<T> {
        let inner = self.inner.lock().unwrap();
        inner
            .transcript
            .as_ref()
            .map(|t| f(t, &inner.annotations))
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSummary {
    pub sentences: usize,
    pub words: usize,
    pub flagged: usize,
}

/// Result of ingesting a `whisper-done` payload. `plain_text` is set when
/// the payload could not be decoded and should be displayed verbatim.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub summary: Option<TranscriptSummary>,
    pub project_dir: Option<String>,
    pub json_file: Option<String>,
    pub plain_text: Option<String>,
}

/// Ingest a `whisper-done` event payload: double-decode it, install the
/// transcript and recompute annotations. Malformed payloads degrade to
/// plain display text instead of failing the command.
#[tauri::command]
pub async fn ingest_whisper_done(app_handle: AppHandle, payload: String) -> Result<IngestResult, String> {
    let state = app_handle.state::<EditorState>();

    match decode_whisper_done(&payload) {
        DecodedTranscription::Parsed {
            transcript,
            project_dir,
            json_file,
        } => {
            let summary = state.install(transcript);
            log::info!(
                "Transcript ingested: {} sentences, {} flagged words",
                summary.sentences,
                summary.flagged
            );
            Ok(IngestResult {
                summary: Some(summary),
                project_dir: Some(project_dir),
                json_file: Some(json_file),
                plain_text: None,
            })
        }
        DecodedTranscription::PlainText(text) => Ok(IngestResult {
            summary: None,
            project_dir: None,
            json_file: None,
            plain_text: Some(text),
        }),
    }
}

/// Change the confidence cutoff and recompute annotations.
#[tauri::command]
pub async fn set_confidence_threshold(
    app_handle: AppHandle,
    threshold: f64,
) -> Result<usize, String> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(format!("Threshold {} is outside [0, 1]", threshold));
    }

    let state = app_handle.state::<EditorState>();
    let mut inner = state.inner.lock().unwrap();
    inner.threshold = threshold;
    let recomputed = inner
        .transcript
        .as_ref()
        .map(|t| extract_low_confidence(t, threshold));
    if let Some(annotations) = recomputed {
        inner.annotations = annotations;
    }
    Ok(inner.annotations.len())
}

#[tauri::command]
pub async fn get_annotations(app_handle: AppHandle) -> Result<Vec<Annotation>, String> {
    let state = app_handle.state::<EditorState>();
    let inner = state.inner.lock().unwrap();
    Ok(inner.annotations.clone())
}

/// Sanitize an edited word and record it in the overlay. Returns the
/// sanitized markup so the editor can re-render exactly what was stored.
/// The canonical transcript is never touched.
#[tauri::command]
pub async fn apply_word_edit(
    app_handle: AppHandle,
    sentence_index: usize,
    word_index: usize,
    raw_markup: String,
) -> Result<String, String> {
    let state = app_handle.state::<EditorState>();
    let mut inner = state.inner.lock().unwrap();

    let in_range = inner
        .transcript
        .as_ref()
        .and_then(|t| t.get(sentence_index))
        .map(|s| word_index < s.words.len())
        .unwrap_or(false);
    if !in_range {
        return Err(format!(
            "No word at position {}.{}",
            sentence_index, word_index
        ));
    }

    let safe = sanitize_word_edit(&raw_markup);
    inner.overlay.set(sentence_index, word_index, safe.clone());
    Ok(safe)
}

/// Revert a word to its canonical text.
#[tauri::command]
pub async fn clear_word_edit(
    app_handle: AppHandle,
    sentence_index: usize,
    word_index: usize,
) -> Result<(), String> {
    let state = app_handle.state::<EditorState>();
    let mut inner = state.inner.lock().unwrap();
    inner.overlay.clear(sentence_index, word_index);
    Ok(())
}

/// Display text for a word: the sanitized edit when one exists, otherwise
/// the canonical recognizer output.
#[tauri::command]
pub async fn get_effective_text(
    app_handle: AppHandle,
    sentence_index: usize,
    word_index: usize,
) -> Result<Option<String>, String> {
    let state = app_handle.state::<EditorState>();
    let inner = state.inner.lock().unwrap();
    let transcript = match inner.transcript.as_ref() {
        Some(t) => t,
        None => return Ok(None),
    };
    Ok(inner
        .overlay
        .effective_text(transcript, sentence_index, word_index)
        .map(|s| s.to_string()))
}

/// Save a transcript JSON file, validating the content first.
#[tauri::command]
pub async fn save_transcript(path: String, json: String) -> Result<(), String> {
    parse_transcript(&json).map_err(String::from)?;

    fs::write(&path, &json).map_err(|e| format!("Failed to write transcript file: {}", e))?;

    log::info!("Saved transcript to {:?}", path);
    Ok(())
}

/// Load a transcript JSON file from disk and install it as the current
/// transcript.
#[tauri::command]
pub async fn load_transcript_file(
    app_handle: AppHandle,
    path: String,
) -> Result<TranscriptSummary, String> {
    let json =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read transcript file: {}", e))?;

    let transcript = parse_transcript(&json).map_err(String::from)?;

    let state = app_handle.state::<EditorState>();
    let summary = state.install(transcript);
    log::info!("Loaded transcript from {:?}", path);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Sentence, Word};

    fn word(text: &str, start: f64, confidence: f64) -> Word {
        Word {
            text: text.to_string(),
            start: Some(start),
            end: Some(start + 0.5),
            confidence,
        }
    }

    fn transcript() -> Transcript {
        vec![Sentence {
            start: Some(0.0),
            end: Some(10.0),
            text: "one two".to_string(),
            words: vec![word("one", 1.0, 0.2), word("two", 4.0, 0.9)],
        }]
    }

    #[test]
    fn install_recomputes_annotations_and_resets_overlay() {
        let state = EditorState::new();
        let summary = state.install(transcript());
        assert_eq!(summary.sentences, 1);
        assert_eq!(summary.words, 2);
        assert_eq!(summary.flagged, 1);

        {
            let mut inner = state.inner.lock().unwrap();
            inner.overlay.set(0, 0, "edited".to_string());
        }

        let summary = state.install(transcript());
        assert_eq!(summary.flagged, 1);
        let inner = state.inner.lock().unwrap();
        assert!(inner.overlay.is_empty());
    }

    #[test]
    fn with_annotations_is_none_before_load() {
        let state = EditorState::new();
        assert!(state.with_annotations(|_, _| ()).is_none());

        state.install(transcript());
        let flagged = state.with_annotations(|_, a| a.len()).unwrap();
        assert_eq!(flagged, 1);
    }

    #[test]
    fn save_rejects_invalid_transcript_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");

        let err = tokio_block_on(save_transcript(
            path.to_string_lossy().to_string(),
            "{\"not\": \"a transcript\"}".to_string(),
        ))
        .unwrap_err();
        assert!(err.contains("Malformed transcript"));
        assert!(!path.exists());
    }

    #[test]
    fn save_writes_valid_transcript_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        let json = serde_json::to_string(&transcript()).unwrap();

        tokio_block_on(save_transcript(
            path.to_string_lossy().to_string(),
            json.clone(),
        ))
        .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), json);
    }

    fn tokio_block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
