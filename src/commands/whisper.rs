//! Transcription RPC surface.
//!
//! The recognizer itself is an external executable; this module owns the
//! session bookkeeping around it: validating the input file, enforcing the
//! one-run-at-a-time rule, streaming its stdout as `whisper-progress`
//! events and delivering the terminal payload on `whisper-done` /
//! `whisper-error`. Completion is always event-delivered, never a command
//! return value; the frontend listens, it does not await.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, Manager};

use crate::commands::files::accept_audio_file;
use crate::error::AppError;
use crate::transcript::payload::encode_whisper_done;
use crate::transcript::parse_transcript;

pub const EVENT_PROGRESS: &str = "whisper-progress";
pub const EVENT_DONE: &str = "whisper-done";
pub const EVENT_ERROR: &str = "whisper-error";

/// Recognizer model size. The closed set matches the ggml model family the
/// recognizer ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

struct TranscriptionSession {
    id: String,
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

/// Cancellation flag and process handle for one run, shared between the
/// session slot and the background task that owns the process.
#[derive(Debug)]
struct SessionHandle {
    cancel: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

/// Managed state holding the at-most-one in-flight transcription. A second
/// start request while this slot is occupied is rejected, not queued.
pub struct TranscriptionState {
    session: Mutex<Option<TranscriptionSession>>,
}

impl TranscriptionState {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    fn begin(&self, id: String) -> Result<SessionHandle, AppError> {
        let mut slot = self.session.lock().unwrap();
        if slot.is_some() {
            return Err(AppError::BackendError(
                "a transcription is already running".to_string(),
            ));
        }
        let handle = SessionHandle {
            cancel: Arc::new(AtomicBool::new(false)),
            child: Arc::new(Mutex::new(None)),
        };
        *slot = Some(TranscriptionSession {
            id,
            cancel: handle.cancel.clone(),
            child: handle.child.clone(),
        });
        Ok(handle)
    }

    fn finish(&self, id: &str) {
        let mut slot = self.session.lock().unwrap();
        if slot.as_ref().map(|s| s.id.as_str()) == Some(id) {
            *slot = None;
        }
    }

    /// Flag the running session as cancelled and kill its process. Killing
    /// here, not in the reader loop, means a recognizer that has gone
    /// quiet between output lines still dies promptly and the slot frees.
    fn cancel_current(&self) -> bool {
        let slot = self.session.lock().unwrap();
        match slot.as_ref() {
            Some(session) => {
                session.cancel.store(true, Ordering::Relaxed);
                if let Some(child) = session.child.lock().unwrap().as_mut() {
                    let _ = child.kill();
                }
                true
            }
            None => false,
        }
    }
}

impl Default for TranscriptionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of the external recognizer binary. Overridable for development and
/// for packaged builds that ship the binary under a different name.
fn recognizer_bin() -> String {
    std::env::var("AUDIOSCRIBE_WHISPER_BIN").unwrap_or_else(|_| "whisper-project".to_string())
}

/// Project directory name for one run: audio file stem plus a timestamp,
/// so repeated runs on the same file never collide.
fn project_dir_name(audio_path: &Path) -> String {
    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project");
    format!("{}-{}", stem, chrono::Local::now().format("%Y%m%d-%H%M%S"))
}

/// Start a transcription run in the background. Completion is delivered via
/// `whisper-done` / `whisper-error`; progress lines via `whisper-progress`.
#[tauri::command]
pub async fn run_whisper_project_bg_safe(
    app_handle: AppHandle,
    filepath: String,
    model_size: ModelSize,
) -> Result<(), String> {
    let audio_path = accept_audio_file(&filepath).map_err(String::from)?;

    let projects_root = app_handle
        .path()
        .app_data_dir()
        .map_err(|e| format!("Failed to resolve app data dir: {}", e))?
        .join("projects");
    let project_dir = projects_root.join(project_dir_name(&audio_path));

    let state = app_handle.state::<TranscriptionState>();
    let session_id = uuid::Uuid::new_v4().to_string();
    let handle = state.begin(session_id.clone()).map_err(String::from)?;

    log::info!(
        "Starting transcription {} for {:?} (model {}, project {:?})",
        session_id,
        audio_path,
        model_size.as_str(),
        project_dir
    );

    let bg_app = app_handle.clone();
    let bg_id = session_id.clone();

    tokio::task::spawn_blocking(move || {
        let outcome = run_recognizer(
            &audio_path,
            model_size,
            &project_dir,
            &handle.cancel,
            &handle.child,
            |line| {
                let _ = bg_app.emit(EVENT_PROGRESS, line);
            },
        );
        match outcome {
            Ok(RecognizerOutcome::Done(payload)) => {
                let _ = bg_app.emit(EVENT_DONE, payload);
            }
            Ok(RecognizerOutcome::Cancelled) => {
                log::info!("Transcription {} cancelled", bg_id);
            }
            Err(e) => {
                log::error!("Transcription {} failed: {}", bg_id, e);
                let _ = bg_app.emit(EVENT_ERROR, e);
            }
        }

        let state = bg_app.state::<TranscriptionState>();
        state.finish(&bg_id);
    });

    Ok(())
}

#[derive(Debug)]
enum RecognizerOutcome {
    /// Double-encoded `whisper-done` payload, ready to emit.
    Done(String),
    Cancelled,
}

/// Kill and reap whatever process is registered in the slot.
fn reap(child_slot: &Mutex<Option<Child>>) {
    if let Some(mut child) = child_slot.lock().unwrap().take() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Run the recognizer process to completion. Each non-final stdout line
/// goes to the progress sink; the final line is the transcript JSON, which
/// gets validated, written to `transcript.json` and wrapped into the done
/// payload. The child is registered in `child_slot` so cancellation can
/// kill it from the outside. Errors come back as plain strings for
/// verbatim display.
fn run_recognizer(
    audio_path: &Path,
    model_size: ModelSize,
    project_dir: &Path,
    cancel: &AtomicBool,
    child_slot: &Mutex<Option<Child>>,
    mut progress: impl FnMut(&str),
) -> Result<RecognizerOutcome, String> {
    std::fs::create_dir_all(project_dir)
        .map_err(|e| format!("Failed to create project dir: {}", e))?;

    let mut child = Command::new(recognizer_bin())
        .arg(audio_path)
        .arg(model_size.as_str())
        .arg(project_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to start recognizer: {}", e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "Recognizer produced no stdout".to_string())?;

    // Drain stderr on its own thread. Left unread, a chatty recognizer
    // fills the pipe buffer, blocks on its next write and stops producing
    // stdout, wedging the reader loop below.
    let stderr_drain = child.stderr.take().map(|stderr| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf);
            buf
        })
    });

    *child_slot.lock().unwrap() = Some(child);
    // A cancel that raced the spawn set the flag before there was a
    // process to kill; catch it now that the child is registered.
    if cancel.load(Ordering::Relaxed) {
        if let Some(child) = child_slot.lock().unwrap().as_mut() {
            let _ = child.kill();
        }
    }

    let mut last_line = String::new();
    for line in BufReader::new(stdout).lines() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                reap(child_slot);
                return Err(format!("Failed to read recognizer output: {}", e));
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        // Progress runs one line behind: the final line is the transcript
        // JSON, not progress, and which line is final is only known at
        // EOF. Emitting eagerly would hand the transcript to the progress
        // channel.
        if !last_line.is_empty() {
            progress(&last_line);
        }
        last_line = line;
    }

    let reaped = child_slot.lock().unwrap().take();
    let mut child = match reaped {
        Some(child) => child,
        None => return Ok(RecognizerOutcome::Cancelled),
    };
    let status = child
        .wait()
        .map_err(|e| format!("Failed to wait for recognizer: {}", e))?;

    let stderr_text = stderr_drain
        .map(|handle| handle.join().unwrap_or_default())
        .unwrap_or_default();

    if cancel.load(Ordering::Relaxed) {
        return Ok(RecognizerOutcome::Cancelled);
    }

    if !status.success() {
        let msg = if stderr_text.trim().is_empty() {
            format!("Recognizer exited with {}", status)
        } else {
            stderr_text.trim().to_string()
        };
        return Err(msg);
    }

    let transcript = parse_transcript(&last_line).map_err(String::from)?;

    let json_file = project_dir.join("transcript.json");
    std::fs::write(&json_file, &last_line)
        .map_err(|e| format!("Failed to write transcript: {}", e))?;

    let payload = encode_whisper_done(
        &transcript,
        &project_dir.to_string_lossy(),
        &json_file.to_string_lossy(),
    )
    .map_err(String::from)?;

    log::info!(
        "Transcription complete: {} sentences, transcript at {:?}",
        transcript.len(),
        json_file
    );
    Ok(RecognizerOutcome::Done(payload))
}

/// Cancel the in-flight transcription, if any. Cancelling when nothing is
/// running is a no-op, matching the frontend's fire-and-forget call.
#[tauri::command]
pub async fn cancel_transcription(app_handle: AppHandle) -> Result<(), String> {
    let state = app_handle.state::<TranscriptionState>();
    if state.cancel_current() {
        log::info!("Cancellation requested");
    } else {
        log::info!("Cancellation requested with no transcription running");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ChunkAck {
    received: usize,
}

/// Accept one base64-encoded audio chunk and acknowledge receipt. The ack
/// is a JSON object with the decoded byte count; recognition output for
/// chunks arrives through the event channel like everything else.
#[tauri::command]
pub async fn process_audio_chunk(payload: String) -> Result<String, String> {
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| String::from(AppError::MalformedPayload(format!("invalid base64: {}", e))))?;

    log::debug!("Received audio chunk: {} bytes", bytes.len());

    serde_json::to_string(&ChunkAck {
        received: bytes.len(),
    })
    .map_err(|e| format!("Failed to encode ack: {}", e))
}
