//! Queue value types.

use serde::{Deserialize, Serialize};

use crate::catalog::{ItemId, Ticks};

/// A playable track. The queue holds value copies; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    pub album_id: Option<ItemId>,
    pub album_name: String,
}

/// Coarse controller state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// No queue loaded.
    #[default]
    Empty,
    Paused,
    Playing,
}

impl PlaybackStatus {
    pub(crate) fn of(current_index: Option<usize>, is_playing: bool) -> Self {
        match (current_index, is_playing) {
            (None, _) => Self::Empty,
            (Some(_), true) => Self::Playing,
            (Some(_), false) => Self::Paused,
        }
    }
}

/// Observable playback state.
///
/// `current_time` always lies within `[0, duration]`. `duration` stays zero
/// until the active source reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: Ticks,
    pub duration: Ticks,
    /// Linear volume in `[0.0, 1.0]`.
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: Ticks::ZERO,
            duration: Ticks::ZERO,
            volume: 0.5,
            shuffle: false,
            repeat: false,
        }
    }
}

/// Read-only copy of everything the controller exposes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueSnapshot {
    pub current_track: Option<Track>,
    pub state: PlaybackState,
    pub queue: Vec<Track>,
    pub current_index: Option<usize>,
}

impl QueueSnapshot {
    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::of(self.current_index, self.state.is_playing)
    }
}
