//! In-place source replacement on a live element.
//!
//! A switch runs five steps in order: capture the position, pause, bind and
//! reload, restore the position, then resume if the element was playing.
//! A newer switch (or [`SourceSwitchCoordinator::supersede`]) invalidates an
//! older one that has not finished. A superseded switch never touches the
//! element again, and the outcome of its resume, if one is in flight, is
//! ignored.

use std::cell::Cell;

use tracing::{debug, warn};

use crate::catalog::Ticks;
use crate::error::MediaError;

use super::{MediaElement, SourceDescriptor};

/// How a switch ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// New source bound, position restored, playback resumed.
    Resumed,
    /// New source bound and positioned; playback was not wanted.
    LeftPaused,
    /// A newer switch took over before this one finished.
    Superseded,
    /// New source bound and positioned, but the element refused to play.
    ResumeRejected,
    /// The new source failed to load. It stays bound.
    LoadFailed,
}

/// Receives failures the coordinator absorbs.
pub trait SwitchObserver {
    fn resume_rejected(&self, source: &SourceDescriptor, error: &MediaError);

    fn load_failed(&self, source: &SourceDescriptor, error: &MediaError) {
        warn!(uri = %source.uri, "source failed to load: {error}");
    }
}

/// Observer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SwitchObserver for LogObserver {
    fn resume_rejected(&self, source: &SourceDescriptor, error: &MediaError) {
        warn!(uri = %source.uri, "playback did not resume after source switch: {error}");
    }
}

/// Position and play intent carried across a switch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Pending {
    position: Ticks,
    resume: bool,
}

pub struct SourceSwitchCoordinator {
    generation: Cell<u64>,
    pending: Cell<Option<Pending>>,
    observer: Box<dyn SwitchObserver>,
}

impl Default for SourceSwitchCoordinator {
    fn default() -> Self {
        Self::new(LogObserver)
    }
}

impl SourceSwitchCoordinator {
    pub fn new(observer: impl SwitchObserver + 'static) -> Self {
        Self {
            generation: Cell::new(0),
            pending: Cell::new(None),
            observer: Box::new(observer),
        }
    }

    /// Whether a switch owns the element right now.
    pub fn is_switching(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Update the play intent applied when the in-flight switch finishes.
    /// Returns `false` when no switch is in flight.
    pub fn set_intent(&self, playing: bool) -> bool {
        self.update_pending(|p| p.resume = playing)
    }

    /// Update the position restored when the in-flight switch finishes.
    /// Returns `false` when no switch is in flight.
    pub fn set_position(&self, position: Ticks) -> bool {
        self.update_pending(|p| p.position = position)
    }

    /// Invalidate any in-flight switch. It will stop before touching the
    /// element's position or play state.
    pub fn supersede(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        if self.pending.take().is_some() {
            debug!("in-flight source switch superseded");
        }
    }

    /// Replace the source, keeping the element's position and play intent.
    pub async fn switch_source<E: MediaElement + ?Sized>(
        &self,
        element: &E,
        source: &SourceDescriptor,
    ) -> SwitchOutcome {
        self.run(element, source, None).await
    }

    /// Replace the source and start from `start`, playing if `play` is set.
    /// Used when the track itself changes.
    pub async fn load_source<E: MediaElement + ?Sized>(
        &self,
        element: &E,
        source: &SourceDescriptor,
        start: Ticks,
        play: bool,
    ) -> SwitchOutcome {
        let target = Pending {
            position: start,
            resume: play,
        };
        self.run(element, source, Some(target)).await
    }

    async fn run<E: MediaElement + ?Sized>(
        &self,
        element: &E,
        source: &SourceDescriptor,
        target: Option<Pending>,
    ) -> SwitchOutcome {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        // An in-flight switch already paused the element; its capture is
        // the last trustworthy one.
        let captured = match (target, self.pending.get()) {
            (Some(target), _) => target,
            (None, Some(inherited)) => inherited,
            (None, None) => Pending {
                position: element.position(),
                resume: element.is_playing(),
            },
        };
        self.pending.set(Some(captured));

        element.pause();
        element.bind_source(source);
        let loaded = element.load().await;

        if self.generation.get() != generation {
            debug!(uri = %source.uri, "source switch superseded during load");
            return SwitchOutcome::Superseded;
        }
        let pending = self.pending.get().unwrap_or(captured);

        if let Err(e) = loaded {
            self.pending.set(None);
            self.observer.load_failed(source, &e);
            return SwitchOutcome::LoadFailed;
        }

        element.seek(pending.position);
        if !pending.resume {
            self.pending.set(None);
            debug!(uri = %source.uri, position = %pending.position, "source switched, paused");
            return SwitchOutcome::LeftPaused;
        }

        // Pending stays set until the resume resolves.
        let played = element.play().await;
        if self.generation.get() != generation {
            debug!(uri = %source.uri, "source switch superseded during resume");
            return SwitchOutcome::Superseded;
        }
        let settled = self.pending.take().unwrap_or(pending);

        if let Err(e) = played {
            self.observer.resume_rejected(source, &e);
            return SwitchOutcome::ResumeRejected;
        }
        if settled.position != pending.position {
            element.seek(settled.position);
        }
        if !settled.resume {
            element.pause();
            debug!(uri = %source.uri, position = %settled.position, "source switched, paused during resume");
            return SwitchOutcome::LeftPaused;
        }
        debug!(uri = %source.uri, position = %settled.position, "source switched, resumed");
        SwitchOutcome::Resumed
    }

    fn update_pending(&self, f: impl FnOnce(&mut Pending)) -> bool {
        match self.pending.get() {
            Some(mut pending) => {
                f(&mut pending);
                self.pending.set(Some(pending));
                true
            }
            None => false,
        }
    }
}
