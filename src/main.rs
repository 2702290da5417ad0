#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod error;
mod playback;
mod sanitize;
mod transcript;

use commands::{files, playback as playback_cmds, transcript as transcript_cmds, whisper};

fn main() {
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .plugin(tauri_plugin_opener::init())
        .manage(whisper::TranscriptionState::new())
        .manage(transcript_cmds::EditorState::new())
        .manage(playback::PlaybackSession::new())
        .invoke_handler(tauri::generate_handler![
            whisper::run_whisper_project_bg_safe,
            whisper::cancel_transcription,
            whisper::process_audio_chunk,
            transcript_cmds::ingest_whisper_done,
            transcript_cmds::set_confidence_threshold,
            transcript_cmds::get_annotations,
            transcript_cmds::apply_word_edit,
            transcript_cmds::clear_word_edit,
            transcript_cmds::get_effective_text,
            transcript_cmds::save_transcript,
            transcript_cmds::load_transcript_file,
            playback_cmds::playback_play,
            playback_cmds::playback_pause,
            playback_cmds::playback_ended,
            playback_cmds::playback_tick,
            playback_cmds::playback_seek,
            playback_cmds::playback_status,
            playback_cmds::seek_next_flagged,
            playback_cmds::seek_prev_flagged,
            files::open_folder,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application")
}
