use tracing::{debug, warn};

use crate::catalog::Ticks;
use crate::config::Settings;

use super::events::{EventBus, Outgoing, PlaybackEvent, Subscription};
use super::shuffle::{IndexPicker, RandomPicker};
use super::types::{PlaybackState, PlaybackStatus, QueueSnapshot, Track};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Owns the queue, the current index and the playback flags.
///
/// Operations apply synchronously in call order. Operations that make no
/// sense in the current state (play on an empty queue, skip past the end
/// without repeat) are no-ops.
pub struct QueueController {
    queue: Vec<Track>,
    current_index: Option<usize>,
    state: PlaybackState,
    restart_threshold: Ticks,
    picker: Box<dyn IndexPicker>,
    events: EventBus,
}

impl QueueController {
    pub fn new(settings: &Settings) -> Self {
        Self::with_picker(settings, RandomPicker::default())
    }

    pub fn with_picker(settings: &Settings, picker: impl IndexPicker + 'static) -> Self {
        let playback = &settings.playback;
        let restart_secs =
            i64::try_from(settings.controls.restart_threshold_secs).unwrap_or(i64::MAX);
        Self {
            queue: Vec::new(),
            current_index: None,
            state: PlaybackState {
                volume: playback.volume.clamp(0.0, 1.0),
                shuffle: playback.shuffle,
                repeat: playback.repeat,
                ..PlaybackState::default()
            },
            restart_threshold: Ticks::from_secs(restart_secs),
            picker: Box::new(picker),
            events: EventBus::default(),
        }
    }

    /// Register for change notifications.
    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus::of(self.current_index, self.state.is_playing)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current_track: self.current_track().cloned(),
            state: self.state.clone(),
            queue: self.queue.clone(),
            current_index: self.current_index,
        }
    }

    /// Replace the queue with a single track.
    pub fn load_track(&mut self, track: Track, auto_play: bool) {
        self.load_queue(vec![track], 0, auto_play);
    }

    /// Replace the queue wholesale. `start_index` is clamped into range; an
    /// empty list leaves the controller empty.
    pub fn load_queue(&mut self, tracks: Vec<Track>, start_index: usize, auto_play: bool) {
        if tracks.is_empty() {
            debug!("empty queue loaded, clearing playback");
            self.clear_playback();
            return;
        }

        let outgoing = self.outgoing();
        let index = start_index.min(tracks.len() - 1);
        let track = tracks[index].clone();

        self.queue = tracks;
        self.current_index = Some(index);
        self.state.is_playing = auto_play;
        self.state.current_time = Ticks::ZERO;
        self.state.duration = Ticks::ZERO;

        debug!(len = self.queue.len(), index, auto_play, "queue loaded");
        self.events.emit(PlaybackEvent::QueueLoaded {
            index,
            track,
            outgoing,
        });
    }

    pub fn play(&mut self) {
        self.set_playing(true);
    }

    pub fn pause(&mut self) {
        self.set_playing(false);
    }

    pub fn toggle_play_pause(&mut self) {
        self.set_playing(!self.state.is_playing);
    }

    /// Move to `time`, clamped to `[0, duration]`. Play state is untouched.
    pub fn seek(&mut self, time: Ticks) {
        if self.current_index.is_none() {
            return;
        }
        let position = time.clamp_to(self.state.duration);
        self.state.current_time = position;
        self.events.emit(PlaybackEvent::Seeked { position });
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta: Ticks) {
        self.seek(self.state.current_time.saturating_add(delta));
    }

    pub fn skip_next(&mut self) {
        if let Some(index) = self.step(Direction::Forward) {
            self.change_to(index);
        }
    }

    /// Go back one track, or restart the current one when it has played
    /// past the restart threshold.
    pub fn skip_previous(&mut self) {
        if self.current_index.is_none() {
            return;
        }
        if self.restart_threshold > Ticks::ZERO && self.state.current_time > self.restart_threshold
        {
            debug!("restarting current track");
            self.seek(Ticks::ZERO);
            return;
        }
        if let Some(index) = self.step(Direction::Backward) {
            self.change_to(index);
        }
    }

    /// The active source finished the current track.
    ///
    /// With repeat on, replays the current track. Otherwise advances like
    /// `skip_next` and keeps playing, or pauses at the end position when
    /// the queue is exhausted.
    pub fn track_ended(&mut self) {
        if self.current_index.is_none() {
            return;
        }
        if self.state.repeat {
            debug!("replaying current track");
            self.seek(Ticks::ZERO);
            self.set_playing(true);
            return;
        }
        match self.step(Direction::Forward) {
            Some(index) => {
                self.change_to(index);
                self.set_playing(true);
            }
            None => {
                self.state.current_time = self.state.duration;
                self.set_playing(false);
            }
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.shuffle = !self.state.shuffle;
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.state.repeat = repeat;
    }

    /// Empty the queue and reset playback, whatever the current state.
    pub fn clear_playback(&mut self) {
        let outgoing = self.outgoing();
        self.queue.clear();
        self.current_index = None;
        self.state.is_playing = false;
        self.state.current_time = Ticks::ZERO;
        self.state.duration = Ticks::ZERO;
        self.events.emit(PlaybackEvent::Cleared { outgoing });
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            debug!("ignoring NaN volume");
            return;
        }
        self.state.volume = volume.clamp(0.0, 1.0);
    }

    /// Duration reported by the active source.
    pub fn set_duration(&mut self, duration: Ticks) {
        if self.current_index.is_none() {
            return;
        }
        self.state.duration = duration.clamp_to(Ticks::new(i64::MAX));
        self.state.current_time = self.state.current_time.clamp_to(self.state.duration);
    }

    /// Clock update from the active source.
    pub fn update_time(&mut self, time: Ticks) {
        if self.current_index.is_none() {
            return;
        }
        self.state.current_time = time.clamp_to(self.state.duration);
    }

    fn set_playing(&mut self, playing: bool) {
        if self.current_index.is_none() {
            debug!(playing, "no queue loaded, ignoring play state change");
            return;
        }
        if self.state.is_playing == playing {
            return;
        }
        self.state.is_playing = playing;
        self.events.emit(PlaybackEvent::PlayStateChanged {
            is_playing: playing,
        });
    }

    fn outgoing(&self) -> Option<Outgoing> {
        self.current_track().map(|track| Outgoing {
            track: track.clone(),
            position: self.state.current_time,
        })
    }

    /// Index to move to, or `None` when the move is a no-op.
    fn step(&mut self, direction: Direction) -> Option<usize> {
        let current = self.current_index?;
        let len = self.queue.len();

        if self.state.shuffle {
            if len < 2 {
                return None;
            }
            let picked = self.picker.pick(len, current);
            if picked < len && picked != current {
                return Some(picked);
            }
            warn!(picked, current, len, "shuffle picker returned an unusable index");
        }

        match direction {
            Direction::Forward if current + 1 < len => Some(current + 1),
            Direction::Backward if current > 0 => Some(current - 1),
            Direction::Forward if self.state.repeat => Some(0),
            Direction::Backward if self.state.repeat => Some(len - 1),
            _ => None,
        }
    }

    fn change_to(&mut self, index: usize) {
        let outgoing = self.outgoing();
        self.current_index = Some(index);
        self.state.current_time = Ticks::ZERO;
        self.state.duration = Ticks::ZERO;

        let track = self.queue[index].clone();
        debug!(index, track = %track.id, "track changed");
        self.events.emit(PlaybackEvent::TrackChanged {
            index,
            track,
            outgoing,
        });
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.events.len()
    }
}
