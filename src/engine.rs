//! One playback surface: queue, live element and remote reporting.
//!
//! The engine is created by whoever owns the playback surface and dropped
//! with it. Controls update the queue synchronously and then reconcile the
//! element; reports are queued and only sent by [`PlayerEngine::flush_reports`].

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Ticks};
use crate::config::Settings;
use crate::media_session::ControlCmd;
use crate::playback::{
    Outgoing, PlaybackEvent, QueueController, QueueSnapshot, Subscription, Track,
};
use crate::reporter::{Report, ReportOutcome, SessionReporter};
use crate::source::{
    MediaElement, SourceDescriptor, SourceSwitchCoordinator, StreamEndpoint, SwitchOutcome,
};

pub struct PlayerEngine<C: Catalog, E: MediaElement> {
    controller: RefCell<QueueController>,
    events: Subscription,
    element: E,
    endpoint: StreamEndpoint,
    coordinator: SourceSwitchCoordinator,
    reporter: SessionReporter<C>,
    outbox: RefCell<Vec<Report>>,
    progress_interval: Option<Duration>,
    seek_step: Ticks,
    last_progress: Cell<Option<Instant>>,
}

impl<C: Catalog, E: MediaElement> PlayerEngine<C, E> {
    pub fn new(settings: &Settings, catalog: Rc<C>, element: E, endpoint: StreamEndpoint) -> Self {
        Self::with_parts(
            settings,
            QueueController::new(settings),
            SourceSwitchCoordinator::default(),
            catalog,
            element,
            endpoint,
        )
    }

    /// Build from preconfigured parts (custom shuffle picker, switch observer).
    pub fn with_parts(
        settings: &Settings,
        mut controller: QueueController,
        coordinator: SourceSwitchCoordinator,
        catalog: Rc<C>,
        element: E,
        endpoint: StreamEndpoint,
    ) -> Self {
        let events = controller.subscribe();
        let interval = settings.reporting.progress_interval_secs;
        let seek_step = i64::try_from(settings.controls.seek_step_secs).unwrap_or(i64::MAX);

        Self {
            controller: RefCell::new(controller),
            events,
            element,
            endpoint,
            coordinator,
            reporter: SessionReporter::new(catalog),
            outbox: RefCell::new(Vec::new()),
            progress_interval: (interval > 0).then(|| Duration::from_secs(interval)),
            seek_step: Ticks::from_secs(seek_step),
            last_progress: Cell::new(None),
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.controller.borrow().snapshot()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn is_switching(&self) -> bool {
        self.coordinator.is_switching()
    }

    /// Reports queued but not yet sent.
    pub fn pending_reports(&self) -> Vec<Report> {
        self.outbox.borrow().clone()
    }

    pub async fn load_track(&self, track: Track, auto_play: bool) {
        self.sync_clock();
        self.controller.borrow_mut().load_track(track, auto_play);
        self.process_events().await;
    }

    pub async fn load_queue(&self, tracks: Vec<Track>, start_index: usize, auto_play: bool) {
        self.sync_clock();
        self.controller
            .borrow_mut()
            .load_queue(tracks, start_index, auto_play);
        self.process_events().await;
    }

    pub async fn play(&self) {
        self.controller.borrow_mut().play();
        self.process_events().await;
    }

    pub async fn pause(&self) {
        self.sync_clock();
        self.controller.borrow_mut().pause();
        self.process_events().await;
    }

    pub async fn toggle_play_pause(&self) {
        self.sync_clock();
        self.controller.borrow_mut().toggle_play_pause();
        self.process_events().await;
    }

    pub async fn seek(&self, time: Ticks) {
        self.controller.borrow_mut().seek(time);
        self.process_events().await;
    }

    pub async fn seek_by(&self, delta: Ticks) {
        self.sync_clock();
        self.controller.borrow_mut().seek_by(delta);
        self.process_events().await;
    }

    /// Jump forward by the configured seek step.
    pub async fn step_forward(&self) {
        self.seek_by(self.seek_step).await;
    }

    /// Jump back by the configured seek step.
    pub async fn step_back(&self) {
        self.seek_by(Ticks::new(-self.seek_step.get())).await;
    }

    pub async fn skip_next(&self) {
        self.sync_clock();
        self.controller.borrow_mut().skip_next();
        self.process_events().await;
    }

    pub async fn skip_previous(&self) {
        self.sync_clock();
        self.controller.borrow_mut().skip_previous();
        self.process_events().await;
    }

    /// The element reached the end of the current track.
    pub async fn track_ended(&self) {
        self.sync_clock();
        self.controller.borrow_mut().track_ended();
        self.process_events().await;

        // A replayed track has no new source to start it; the element
        // stopped at the end and has to be told to play again.
        let playing = self.controller.borrow().state().is_playing;
        if playing {
            self.apply_play_state(true).await;
            self.process_events().await;
        }
    }

    pub async fn clear_playback(&self) {
        self.sync_clock();
        self.controller.borrow_mut().clear_playback();
        self.process_events().await;
    }

    pub fn toggle_shuffle(&self) {
        self.controller.borrow_mut().toggle_shuffle();
    }

    pub fn set_repeat(&self, repeat: bool) {
        self.controller.borrow_mut().set_repeat(repeat);
    }

    pub fn set_volume(&self, volume: f32) {
        self.controller.borrow_mut().set_volume(volume);
    }

    /// Duration reported by the element once the source metadata is known.
    pub fn set_duration(&self, duration: Ticks) {
        self.controller.borrow_mut().set_duration(duration);
    }

    /// Replace the current track's source (quality or version change),
    /// keeping position and play intent.
    pub async fn switch_source(&self, source: &SourceDescriptor) -> SwitchOutcome {
        let outcome = self
            .coordinator
            .switch_source(&self.element, source)
            .await;
        self.settle_switch(outcome);
        self.process_events().await;
        outcome
    }

    /// Drive periodic work: pull the element clock into the queue state and
    /// queue a progress report once per interval while playing.
    pub fn tick(&self, now: Instant) {
        if self.coordinator.is_switching() {
            return;
        }
        self.sync_clock();

        let Some(interval) = self.progress_interval else {
            return;
        };
        if !self.controller.borrow().state().is_playing {
            self.last_progress.set(None);
            return;
        }
        match self.last_progress.get() {
            None => self.last_progress.set(Some(now)),
            Some(last) if now.saturating_duration_since(last) >= interval => {
                self.last_progress.set(Some(now));
                self.queue_progress(false);
            }
            Some(_) => {}
        }
    }

    /// Send every queued report. Outcomes come back in queue order.
    pub async fn flush_reports(&self) -> Vec<ReportOutcome> {
        let reports = mem::take(&mut *self.outbox.borrow_mut());
        if reports.is_empty() {
            return Vec::new();
        }
        debug!(count = reports.len(), "flushing playback reports");
        join_all(reports.iter().map(|r| self.reporter.send(r))).await
    }

    /// Apply a command from OS media controls. Returns `true` when the
    /// host was asked to quit.
    pub async fn apply_control(&self, cmd: ControlCmd) -> bool {
        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::Play => self.play().await,
            ControlCmd::Pause => self.pause().await,
            ControlCmd::PlayPause => self.toggle_play_pause().await,
            ControlCmd::Stop => self.clear_playback().await,
            ControlCmd::Next => self.skip_next().await,
            ControlCmd::Prev => self.skip_previous().await,
            ControlCmd::SeekBy(delta) => self.seek_by(delta).await,
            ControlCmd::SetPosition(position) => self.seek(position).await,
            ControlCmd::SetVolume(volume) => self.set_volume(volume),
            ControlCmd::SetShuffle(on) => {
                if self.controller.borrow().state().shuffle != on {
                    self.toggle_shuffle();
                }
            }
            ControlCmd::SetRepeat(repeat) => self.set_repeat(repeat),
        }
        false
    }

    async fn process_events(&self) {
        while let Some(event) = self.events.try_next() {
            match event {
                PlaybackEvent::QueueLoaded {
                    track, outgoing, ..
                } => {
                    self.coordinator.supersede();
                    self.queue_stop(outgoing);
                    self.queue_start(&track);
                    self.start_track(&track).await;
                }
                PlaybackEvent::TrackChanged {
                    track, outgoing, ..
                } => {
                    self.queue_stop(outgoing);
                    self.queue_start(&track);
                    self.start_track(&track).await;
                }
                PlaybackEvent::PlayStateChanged { is_playing } => {
                    self.apply_play_state(is_playing).await;
                }
                PlaybackEvent::Seeked { position } => {
                    if !self.coordinator.set_position(position) {
                        self.element.seek(position);
                    }
                    let paused = !self.controller.borrow().state().is_playing;
                    self.queue_progress(paused);
                }
                PlaybackEvent::Cleared { outgoing } => {
                    self.coordinator.supersede();
                    self.queue_stop(outgoing);
                    self.last_progress.set(None);
                    self.element.pause();
                    self.element.clear_source();
                }
            }
        }
    }

    async fn start_track(&self, track: &Track) {
        let source = self.endpoint.audio_source(&track.id);
        let play = self.controller.borrow().state().is_playing;
        self.last_progress.set(None);

        let outcome = self
            .coordinator
            .load_source(&self.element, &source, Ticks::ZERO, play)
            .await;
        debug!(track = %track.id, ?outcome, "track source loaded");
        self.settle_switch(outcome);
    }

    /// Bring queue state in line with what the element ended up doing.
    fn settle_switch(&self, outcome: SwitchOutcome) {
        match outcome {
            SwitchOutcome::ResumeRejected | SwitchOutcome::LoadFailed => {
                self.controller.borrow_mut().pause();
            }
            SwitchOutcome::Resumed | SwitchOutcome::LeftPaused | SwitchOutcome::Superseded => {}
        }
    }

    async fn apply_play_state(&self, playing: bool) {
        if self.coordinator.set_intent(playing) {
            return;
        }
        if playing {
            if self.element.is_playing() {
                return;
            }
            if let Err(e) = self.element.play().await {
                warn!("playback did not start: {e}");
                self.controller.borrow_mut().pause();
            }
        } else {
            if self.element.is_playing() {
                self.element.pause();
            }
            self.queue_progress(true);
        }
    }

    /// Pull the element's clock into the queue state.
    fn sync_clock(&self) {
        if self.coordinator.is_switching() {
            return;
        }
        let position = self.element.position();
        self.controller.borrow_mut().update_time(position);
    }

    fn queue_stop(&self, outgoing: Option<Outgoing>) {
        if let Some(Outgoing { track, position }) = outgoing {
            self.outbox.borrow_mut().push(Report::Stop {
                item_id: track.id,
                position,
            });
        }
    }

    fn queue_start(&self, track: &Track) {
        self.outbox.borrow_mut().push(Report::Start {
            item_id: track.id.clone(),
            position: Ticks::ZERO,
        });
    }

    fn queue_progress(&self, paused: bool) {
        let controller = self.controller.borrow();
        if let Some(track) = controller.current_track() {
            self.outbox.borrow_mut().push(Report::Progress {
                item_id: track.id.clone(),
                position: controller.state().current_time,
                paused,
            });
        }
    }
}

#[cfg(test)]
mod tests;
