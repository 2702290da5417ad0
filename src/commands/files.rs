//! File acceptance and filesystem-facing commands.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Extensions we accept as audio input, mirroring the `audio/*` media-type
/// check on the drop surface.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "m4a", "aac", "flac", "ogg", "oga", "opus", "wma", "aiff", "aif",
];

pub fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate a user-selected or dropped file before handing it to the
/// recognizer. An empty or unresolvable path is `MissingFilePath`; a
/// resolvable non-audio file is `UnsupportedFileType`.
pub fn accept_audio_file(filepath: &str) -> Result<PathBuf, AppError> {
    if filepath.trim().is_empty() {
        return Err(AppError::MissingFilePath(
            "no file path was provided".to_string(),
        ));
    }

    let path = PathBuf::from(filepath);
    if !path.exists() {
        return Err(AppError::MissingFilePath(format!(
            "{} does not exist",
            path.display()
        )));
    }

    if !is_audio_path(&path) {
        return Err(AppError::UnsupportedFileType(format!(
            "{} is not an audio file",
            path.display()
        )));
    }

    Ok(path)
}

/// Open a folder in the system file manager.
#[tauri::command]
pub async fn open_folder(path: String) -> Result<(), String> {
    let folder = Path::new(&path);
    if !folder.is_dir() {
        return Err(String::from(AppError::MissingFilePath(format!(
            "{} is not a folder",
            path
        ))));
    }

    log::info!("Opening folder {:?}", folder);
    tauri_plugin_opener::open_path(folder, None::<&str>)
        .map_err(|e| format!("Failed to open folder: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn audio_extensions_match_case_insensitively() {
        assert!(is_audio_path(Path::new("a.mp3")));
        assert!(is_audio_path(Path::new("a.WAV")));
        assert!(is_audio_path(Path::new("/x/y/take 2.FLAC")));
        assert!(!is_audio_path(Path::new("a.txt")));
        assert!(!is_audio_path(Path::new("mp3")));
    }

    #[test]
    fn empty_path_is_missing_file_path() {
        let err = accept_audio_file("").unwrap_err();
        assert!(matches!(err, AppError::MissingFilePath(_)));
        let err = accept_audio_file("   ").unwrap_err();
        assert!(matches!(err, AppError::MissingFilePath(_)));
    }

    #[test]
    fn nonexistent_path_is_missing_file_path() {
        let err = accept_audio_file("/no/such/file.mp3").unwrap_err();
        assert!(matches!(err, AppError::MissingFilePath(_)));
    }

    #[test]
    fn non_audio_file_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        writeln!(std::fs::File::create(&path).unwrap(), "x").unwrap();

        let err = accept_audio_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFileType(_)));
    }

    #[test]
    fn audio_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::File::create(&path).unwrap();

        let accepted = accept_audio_file(path.to_str().unwrap()).unwrap();
        assert_eq!(accepted, path);
    }
}
