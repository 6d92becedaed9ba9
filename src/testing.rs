//! In-memory collaborators shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::channel::oneshot;

use crate::catalog::{Catalog, CatalogItem, ItemId, SessionId, Ticks};
use crate::error::{CatalogError, CatalogResult, MediaError, MediaResult};
use crate::playback::Track;
use crate::source::{MediaElement, SourceDescriptor};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn item(id: &str, last_played: Option<i64>) -> CatalogItem {
    let item = CatalogItem::new(id);
    match last_played {
        Some(secs) => item.with_last_played(at(secs)),
        None => item,
    }
}

pub fn track(id: &str) -> Track {
    Track {
        id: ItemId::from(id),
        title: format!("Title {id}"),
        artist: "Artist".to_string(),
        album_id: Some(ItemId::from("album")),
        album_name: "Album".to_string(),
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionCall {
    pub session: SessionId,
    pub item: ItemId,
    pub position: Ticks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressCall {
    pub session: SessionId,
    pub item: ItemId,
    pub position: Ticks,
    pub paused: bool,
}

/// Scripted catalog. `None` lists make the matching request fail.
#[derive(Default)]
pub struct FakeCatalog {
    pub resume: Option<Vec<CatalogItem>>,
    pub next_up: Option<Vec<CatalogItem>>,
    pub windows: HashMap<ItemId, Vec<CatalogItem>>,
    pub sessions: HashMap<ItemId, SessionId>,
    pub client_session: Option<SessionId>,
    pub session_lookup_fails: bool,
    pub reports_fail: bool,
    pub resume_limits: RefCell<Vec<usize>>,
    pub window_requests: RefCell<Vec<(ItemId, ItemId, usize)>>,
    pub starts: RefCell<Vec<PositionCall>>,
    pub stops: RefCell<Vec<PositionCall>>,
    pub progress: RefCell<Vec<ProgressCall>>,
}

impl FakeCatalog {
    pub fn with_lists(resume: Vec<CatalogItem>, next_up: Vec<CatalogItem>) -> Self {
        Self {
            resume: Some(resume),
            next_up: Some(next_up),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, item: &str, session: &str) -> Self {
        self.sessions
            .insert(ItemId::from(item), SessionId::new(session));
        self
    }

    pub fn with_client_session(mut self, session: &str) -> Self {
        self.client_session = Some(SessionId::new(session));
        self
    }
}

#[async_trait(?Send)]
impl Catalog for FakeCatalog {
    async fn fetch_resume_items(
        &self,
        _user_id: &str,
        limit: usize,
    ) -> CatalogResult<Vec<CatalogItem>> {
        self.resume_limits.borrow_mut().push(limit);
        self.resume
            .clone()
            .ok_or_else(|| CatalogError::Transport("resume unavailable".into()))
    }

    async fn fetch_next_up_items(
        &self,
        _user_id: &str,
        _limit: usize,
    ) -> CatalogResult<Vec<CatalogItem>> {
        self.next_up
            .clone()
            .ok_or_else(|| CatalogError::Transport("next up unavailable".into()))
    }

    async fn fetch_adjacent_window(
        &self,
        series_id: &ItemId,
        current_item_id: &ItemId,
        window_size: usize,
    ) -> CatalogResult<Vec<CatalogItem>> {
        self.window_requests.borrow_mut().push((
            series_id.clone(),
            current_item_id.clone(),
            window_size,
        ));
        self.windows
            .get(current_item_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(current_item_id.to_string()))
    }

    async fn find_session_for_item(&self, item_id: &ItemId) -> CatalogResult<Option<SessionId>> {
        if self.session_lookup_fails {
            return Err(CatalogError::Transport("sessions unavailable".into()));
        }
        Ok(self.sessions.get(item_id).cloned())
    }

    async fn current_session(&self) -> CatalogResult<Option<SessionId>> {
        if self.session_lookup_fails {
            return Err(CatalogError::Transport("sessions unavailable".into()));
        }
        Ok(self.client_session.clone())
    }

    async fn report_playback_start(
        &self,
        session_id: &SessionId,
        item_id: &ItemId,
        position: Ticks,
    ) -> CatalogResult<()> {
        self.starts.borrow_mut().push(PositionCall {
            session: session_id.clone(),
            item: item_id.clone(),
            position,
        });
        if self.reports_fail {
            return Err(CatalogError::Transport("report rejected".into()));
        }
        Ok(())
    }

    async fn report_stop_position(
        &self,
        session_id: &SessionId,
        item_id: &ItemId,
        position: Ticks,
    ) -> CatalogResult<()> {
        self.stops.borrow_mut().push(PositionCall {
            session: session_id.clone(),
            item: item_id.clone(),
            position,
        });
        if self.reports_fail {
            return Err(CatalogError::Transport("report rejected".into()));
        }
        Ok(())
    }

    async fn report_progress(
        &self,
        session_id: &SessionId,
        item_id: &ItemId,
        position: Ticks,
        paused: bool,
    ) -> CatalogResult<()> {
        self.progress.borrow_mut().push(ProgressCall {
            session: session_id.clone(),
            item: item_id.clone(),
            position,
            paused,
        });
        if self.reports_fail {
            return Err(CatalogError::Transport("report rejected".into()));
        }
        Ok(())
    }
}

/// Every call made on a [`FakeElement`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementCall {
    Position,
    Pause,
    Bind(String),
    Clear,
    Load,
    Seek(Ticks),
    Play,
}

/// Media element whose loads can be held open by the test.
#[derive(Default)]
pub struct FakeElement {
    pub position: Cell<Ticks>,
    pub playing: Cell<bool>,
    pub bound: RefCell<Option<SourceDescriptor>>,
    pub calls: RefCell<Vec<ElementCall>>,
    pub reject_play: Cell<bool>,
    pub fail_load: Cell<bool>,
    gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    play_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
}

impl FakeElement {
    pub fn playing_at(position: Ticks) -> Self {
        let element = Self::default();
        element.position.set(position);
        element.playing.set(true);
        element
    }

    /// Make the next `load()` wait until the returned sender fires.
    pub fn hold_next_load(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }

    /// Make the next `play()` wait until the returned sender fires.
    pub fn hold_next_play(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.play_gates.borrow_mut().push_back(rx);
        tx
    }

    pub fn play_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c == ElementCall::Play)
            .count()
    }

    pub fn bound_uri(&self) -> Option<String> {
        self.bound.borrow().as_ref().map(|d| d.uri.clone())
    }
}

#[async_trait(?Send)]
impl MediaElement for FakeElement {
    fn position(&self) -> Ticks {
        self.calls.borrow_mut().push(ElementCall::Position);
        self.position.get()
    }

    fn is_playing(&self) -> bool {
        self.playing.get()
    }

    fn pause(&self) {
        self.calls.borrow_mut().push(ElementCall::Pause);
        self.playing.set(false);
    }

    fn bind_source(&self, source: &SourceDescriptor) {
        self.calls
            .borrow_mut()
            .push(ElementCall::Bind(source.uri.clone()));
        *self.bound.borrow_mut() = Some(source.clone());
        self.position.set(Ticks::ZERO);
    }

    fn clear_source(&self) {
        self.calls.borrow_mut().push(ElementCall::Clear);
        *self.bound.borrow_mut() = None;
        self.position.set(Ticks::ZERO);
    }

    async fn load(&self) -> MediaResult<()> {
        self.calls.borrow_mut().push(ElementCall::Load);
        let gate = self.gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_load.get() {
            let uri = self.bound_uri().unwrap_or_default();
            return Err(MediaError::Load {
                uri,
                reason: "unsupported container".into(),
            });
        }
        Ok(())
    }

    fn seek(&self, position: Ticks) {
        self.calls.borrow_mut().push(ElementCall::Seek(position));
        self.position.set(position);
    }

    async fn play(&self) -> MediaResult<()> {
        self.calls.borrow_mut().push(ElementCall::Play);
        let gate = self.play_gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.reject_play.get() {
            return Err(MediaError::PlayRejected("autoplay blocked".into()));
        }
        self.playing.set(true);
        Ok(())
    }
}
