//! Playback session state.
//!
//! One `PlaybackSession` lives in managed state and is the single owner of
//! the playback position. During normal playback the audio surface is the
//! only writer, via `tick`; the editor side may move the position only
//! through `seek`, which always resumes playback at the new time. That
//! seek-resumes policy is deliberate: jumping to a flagged word should
//! start playing it, never leave the player paused.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    /// Transient: the position is being moved by an explicit seek. Playback
    /// resumes before the seek call returns, so the state is only ever
    /// observed here from inside the transition itself.
    Seeking,
}

pub struct PlaybackSession {
    state: Mutex<PlaybackState>,
    /// Current time in seconds, f64 bits in an AtomicU64 so ticks never
    /// contend with readers.
    position: AtomicU64,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlaybackState::Idle),
            position: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap()
    }

    pub fn current_time(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Relaxed))
    }

    fn set_time(&self, time: f64) {
        self.position.store(time.to_bits(), Ordering::Relaxed);
    }

    pub fn play(&self) {
        *self.state.lock().unwrap() = PlaybackState::Playing;
    }

    pub fn pause(&self) {
        *self.state.lock().unwrap() = PlaybackState::Idle;
    }

    /// End of media: back to idle, position left where playback stopped.
    pub fn ended(&self) {
        *self.state.lock().unwrap() = PlaybackState::Idle;
    }

    /// Periodic time update from the audio surface. Ignored unless the
    /// session is playing, so a stale tick arriving after pause or seek
    /// cannot drag the position backwards.
    pub fn tick(&self, time: f64) {
        let state = self.state.lock().unwrap();
        if *state == PlaybackState::Playing {
            self.set_time(time);
        }
    }

    /// Explicit seek from the edit/navigation surface. Always resumes
    /// playback at the new position, including from idle.
    pub fn seek(&self, time: f64) {
        let mut state = self.state.lock().unwrap();
        *state = PlaybackState::Seeking;
        self.set_time(time);
        *state = PlaybackState::Playing;
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_at_zero() {
        let session = PlaybackSession::new();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(session.current_time(), 0.0);
    }

    #[test]
    fn play_then_pause() {
        let session = PlaybackSession::new();
        session.play();
        assert_eq!(session.state(), PlaybackState::Playing);
        session.pause();
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[test]
    fn tick_advances_time_only_while_playing() {
        let session = PlaybackSession::new();
        session.tick(5.0);
        assert_eq!(session.current_time(), 0.0);

        session.play();
        session.tick(5.0);
        assert_eq!(session.current_time(), 5.0);

        session.pause();
        session.tick(9.0);
        assert_eq!(session.current_time(), 5.0);
    }

    #[test]
    fn seek_while_playing_resumes_at_new_position() {
        let session = PlaybackSession::new();
        session.play();
        session.tick(10.0);

        session.seek(42.0);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.current_time(), 42.0);
    }

    #[test]
    fn seek_from_idle_also_resumes() {
        let session = PlaybackSession::new();
        session.seek(3.5);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.current_time(), 3.5);
    }

    #[test]
    fn ended_keeps_final_position() {
        let session = PlaybackSession::new();
        session.play();
        session.tick(120.0);
        session.ended();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(session.current_time(), 120.0);
    }
}
