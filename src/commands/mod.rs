pub mod files;
pub mod playback;
pub mod transcript;
pub mod whisper;
