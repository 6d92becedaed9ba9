//! OS media controls (MPRIS over D-Bus).
//!
//! The D-Bus service runs on its own thread and never touches the engine:
//! incoming calls become [`ControlCmd`]s on a channel, and the host pushes
//! state back through a [`MediaSessionHandle`].

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::catalog::Ticks;
use crate::playback::{PlaybackStatus, QueueSnapshot, Track};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.cadenza";
const NOTIFY_POLL: Duration = Duration::from_millis(250);

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek; negative values go back.
    SeekBy(Ticks),
    SetPosition(Ticks),
    SetVolume(f32),
    SetShuffle(bool),
    SetRepeat(bool),
}

#[derive(Debug, Default)]
struct SharedState {
    status: PlaybackStatus,
    position: Ticks,
    volume: f64,
    shuffle: bool,
    repeat: bool,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
}

/// Host-side handle used to publish playback state.
pub struct MediaSessionHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MediaSessionHandle {
    /// Publish the current track. `None` clears the metadata.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>, length: Ticks) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.title = Some(t.title.clone());
                    s.artist = if t.artist.is_empty() {
                        Vec::new()
                    } else {
                        vec![t.artist.clone()]
                    };
                    s.album = (!t.album_name.is_empty()).then(|| t.album_name.clone());
                    s.length_micros = (length > Ticks::ZERO).then(|| micros(length));
                    s.track_id = index.and_then(track_path);
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    pub fn set_playback(&self, status: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.status = status;
        }
        let _ = self.notify.send(());
    }

    /// Publish everything the bridge exposes from one engine snapshot.
    pub fn sync(&self, snapshot: &QueueSnapshot) {
        if let Ok(mut s) = self.state.lock() {
            s.position = snapshot.state.current_time;
            s.volume = f64::from(snapshot.state.volume);
            s.shuffle = snapshot.state.shuffle;
            s.repeat = snapshot.state.repeat;
        }
        self.set_track_metadata(
            snapshot.current_index,
            snapshot.current_track.as_ref(),
            snapshot.state.duration,
        );
        self.set_playback(snapshot.status());
    }
}

fn micros(ticks: Ticks) -> i64 {
    ticks.get() / 10
}

fn from_micros(us: i64) -> Ticks {
    Ticks::new(us.saturating_mul(10))
}

fn track_path(index: usize) -> Option<ObjectPath<'static>> {
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{index}")).ok()
}

fn owned<'a>(value: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(value.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "cadenza"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("media session command dropped, host is gone");
        }
    }

    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T) -> Option<T> {
        self.state.lock().ok().map(|s| f(&s))
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// Offset in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(from_micros(offset)));
    }

    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        // Stale requests for a track that is no longer current are ignored.
        let current = self.read(|s| s.track_id.clone()).flatten();
        if current.as_ref().map(|p| p.as_str()) != Some(track_id.as_str()) {
            return;
        }
        self.send(ControlCmd::SetPosition(from_micros(position)));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.read(|s| s.status) {
            Some(PlaybackStatus::Playing) => "Playing",
            Some(PlaybackStatus::Paused) => "Paused",
            Some(PlaybackStatus::Empty) | None => "Stopped",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        if self.read(|s| s.repeat).unwrap_or(false) {
            "Playlist"
        } else {
            "None"
        }
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        self.send(ControlCmd::SetRepeat(value != "None"));
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        self.send(ControlCmd::SetVolume(value.clamp(0.0, 1.0) as f32));
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(|s| micros(s.position)).unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let entries = [
            ("mpris:trackid", s.track_id.clone().and_then(owned)),
            ("xesam:title", s.title.clone().and_then(owned)),
            (
                "xesam:artist",
                (!s.artist.is_empty()).then(|| s.artist.clone()).and_then(owned),
            ),
            ("xesam:album", s.album.clone().and_then(owned)),
            ("mpris:length", s.length_micros.and_then(owned)),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

/// Start the MPRIS service on a background thread.
///
/// Commands arrive on `tx`. Dropping the returned handle stops the service.
pub fn spawn_media_session(tx: Sender<ControlCmd>) -> MediaSessionHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = channel();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MediaSessionHandle { state, notify }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            warn!("media session: failed to connect to session bus: {e}");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        warn!("media session: failed to acquire {BUS_NAME}: {e}");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await
    {
        warn!("media session: failed to register root interface: {e}");
        return;
    }

    if let Err(e) = object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await
    {
        warn!("media session: failed to register player interface: {e}");
        return;
    }

    let player = match object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await
    {
        Ok(player) => player,
        Err(e) => {
            warn!("media session: player interface unavailable: {e}");
            return;
        }
    };

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("media session handle dropped, stopping service");
                    return;
                }
            }
        }
        if !changed {
            continue;
        }

        let iface = player.get().await;
        let emitter = player.signal_emitter();
        let emitted = async {
            iface.playback_status_changed(emitter).await?;
            iface.metadata_changed(emitter).await?;
            iface.shuffle_changed(emitter).await?;
            iface.loop_status_changed(emitter).await?;
            iface.volume_changed(emitter).await
        };
        if let Err(e) = emitted.await {
            debug!("media session: failed to emit property changes: {e}");
        }
    }
}
