//! Playback commands over the managed `PlaybackSession`, including
//! flagged-word navigation.

use serde::Serialize;
use tauri::{AppHandle, Manager};

use crate::commands::transcript::EditorState;
use crate::playback::{PlaybackSession, PlaybackState};
use crate::transcript::annotations::{next_flagged_start, prev_flagged_start};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_time: f64,
}

#[tauri::command]
pub fn playback_play(state: tauri::State<'_, PlaybackSession>) -> Result<(), String> {
    state.play();
    log::info!("Playback started at {:.2}s", state.current_time());
    Ok(())
}

#[tauri::command]
pub fn playback_pause(state: tauri::State<'_, PlaybackSession>) -> Result<(), String> {
    state.pause();
    log::info!("Playback paused at {:.2}s", state.current_time());
    Ok(())
}

/// End-of-media notification from the audio surface.
#[tauri::command]
pub fn playback_ended(state: tauri::State<'_, PlaybackSession>) -> Result<(), String> {
    state.ended();
    Ok(())
}

/// Periodic time update from the audio surface. Only applied while the
/// session is playing.
#[tauri::command]
pub fn playback_tick(time: f64, state: tauri::State<'_, PlaybackSession>) -> Result<(), String> {
    state.tick(time);
    Ok(())
}

/// Explicit seek from the editor side. Always resumes playback at the new
/// position.
#[tauri::command]
pub fn playback_seek(time: f64, state: tauri::State<'_, PlaybackSession>) -> Result<(), String> {
    state.seek(time);
    Ok(())
}

#[tauri::command]
pub fn playback_status(state: tauri::State<'_, PlaybackSession>) -> Result<PlaybackStatus, String> {
    Ok(PlaybackStatus {
        state: state.state(),
        current_time: state.current_time(),
    })
}

/// Seek to the next flagged word after the current position. Returns the
/// seek target, or None when there is no later flagged word (a no-op).
#[tauri::command]
pub fn seek_next_flagged(app_handle: AppHandle) -> Result<Option<f64>, String> {
    seek_flagged(&app_handle, Direction::Next)
}

/// Seek to the last flagged word before the current position.
#[tauri::command]
pub fn seek_prev_flagged(app_handle: AppHandle) -> Result<Option<f64>, String> {
    seek_flagged(&app_handle, Direction::Prev)
}

enum Direction {
    Next,
    Prev,
}

fn seek_flagged(app_handle: &AppHandle, direction: Direction) -> Result<Option<f64>, String> {
    let session = app_handle.state::<PlaybackSession>();
    let editor = app_handle.state::<EditorState>();

    let current = session.current_time();
    let target = editor
        .with_annotations(|transcript, annotations| match direction {
            Direction::Next => next_flagged_start(transcript, annotations, current),
            Direction::Prev => prev_flagged_start(transcript, annotations, current),
        })
        .flatten();

    if let Some(time) = target {
        session.seek(time);
        log::info!("Seeking to flagged word at {:.2}s", time);
    }
    Ok(target)
}
