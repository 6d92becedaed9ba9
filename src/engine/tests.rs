use std::rc::Rc;
use std::time::{Duration, Instant};

use async_io::block_on;
use futures::join;

use super::*;
use crate::catalog::{ItemId, SessionId};
use crate::config::ServerSettings;
use crate::playback::PlaybackStatus;
use crate::testing::{ElementCall, FakeCatalog, FakeElement, PositionCall, track, tracks};

type Engine = PlayerEngine<FakeCatalog, FakeElement>;

fn secs(s: i64) -> Ticks {
    Ticks::from_secs(s)
}

fn endpoint() -> StreamEndpoint {
    let server = ServerSettings {
        base_url: Some("https://media.example.org".to_string()),
        ..ServerSettings::default()
    };
    StreamEndpoint::new(&server, "key").unwrap()
}

fn engine_with(settings: &Settings, catalog: FakeCatalog) -> (Engine, Rc<FakeCatalog>) {
    let catalog = Rc::new(catalog);
    let engine = PlayerEngine::new(settings, catalog.clone(), FakeElement::default(), endpoint());
    (engine, catalog)
}

fn engine() -> Engine {
    engine_with(&Settings::default(), FakeCatalog::default()).0
}

fn hd() -> SourceDescriptor {
    SourceDescriptor::new("https://media.example.org/hd").with_quality("1080p")
}

fn started(id: &str) -> Report {
    Report::Start {
        item_id: ItemId::from(id),
        position: Ticks::ZERO,
    }
}

fn stop(id: &str, position: Ticks) -> Report {
    Report::Stop {
        item_id: ItemId::from(id),
        position,
    }
}

fn progress(id: &str, position: Ticks, paused: bool) -> Report {
    Report::Progress {
        item_id: ItemId::from(id),
        position,
        paused,
    }
}

#[test]
fn loading_a_track_binds_its_stream_and_plays() {
    let engine = engine();

    block_on(engine.load_track(track("a"), true));

    let uri = engine.element().bound_uri().unwrap();
    assert!(uri.starts_with("https://media.example.org/Audio/a/universal?"));
    assert_eq!(engine.element().play_calls(), 1);
    assert!(engine.element().playing.get());
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Playing);
    assert!(!engine.is_switching());
    assert_eq!(engine.pending_reports(), vec![started("a")]);
}

#[test]
fn loading_without_auto_play_leaves_element_paused() {
    let engine = engine();

    block_on(engine.load_track(track("a"), false));

    assert_eq!(engine.element().play_calls(), 0);
    assert!(engine.element().bound_uri().is_some());
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Paused);
}

#[test]
fn skipping_reports_where_the_outgoing_track_stopped() {
    let (engine, catalog) = engine_with(
        &Settings::default(),
        FakeCatalog::default()
            .with_session("a", "s1")
            .with_client_session("me"),
    );
    block_on(engine.load_queue(tracks(&["a", "b"]), 0, true));
    assert_eq!(
        block_on(engine.flush_reports()),
        vec![ReportOutcome::Sent]
    );
    engine.set_duration(secs(200));
    engine.element().position.set(secs(30));

    block_on(engine.skip_next());

    assert_eq!(
        engine.pending_reports(),
        vec![stop("a", secs(30)), started("b")]
    );
    assert!(engine.element().bound_uri().unwrap().contains("/Audio/b/"));
    assert_eq!(engine.snapshot().current_index, Some(1));

    let outcomes = block_on(engine.flush_reports());
    assert_eq!(outcomes, vec![ReportOutcome::Sent, ReportOutcome::Sent]);
    let starts: Vec<(SessionId, ItemId)> = catalog
        .starts
        .borrow()
        .iter()
        .map(|c| (c.session.clone(), c.item.clone()))
        .collect();
    assert_eq!(
        starts,
        vec![
            (SessionId::new("me"), ItemId::from("a")),
            (SessionId::new("me"), ItemId::from("b")),
        ]
    );
    assert_eq!(
        catalog.stops.borrow().as_slice(),
        &[PositionCall {
            session: SessionId::new("s1"),
            item: ItemId::from("a"),
            position: secs(30),
        }]
    );
    assert!(engine.pending_reports().is_empty());
    assert!(block_on(engine.flush_reports()).is_empty());
}

#[test]
fn reports_without_a_session_are_dropped() {
    let engine = engine();
    block_on(engine.load_queue(tracks(&["a", "b"]), 0, true));
    block_on(engine.skip_next());

    assert_eq!(
        block_on(engine.flush_reports()),
        vec![ReportOutcome::NoSession; 3]
    );
}

#[test]
fn pausing_queues_a_paused_progress_report() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    block_on(engine.flush_reports());
    engine.set_duration(secs(100));
    engine.element().position.set(secs(12));

    block_on(engine.pause());

    assert!(!engine.element().playing.get());
    assert_eq!(engine.pending_reports(), vec![progress("a", secs(12), true)]);

    block_on(engine.play());
    assert!(engine.element().playing.get());
    assert_eq!(engine.element().play_calls(), 2);
}

#[test]
fn rejected_playback_pauses_the_queue() {
    let engine = engine();
    engine.element().reject_play.set(true);

    block_on(engine.load_track(track("a"), true));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.status(), PlaybackStatus::Paused);
    assert_eq!(snapshot.current_track, Some(track("a")));
    assert_eq!(
        engine.pending_reports(),
        vec![started("a"), progress("a", Ticks::ZERO, true)]
    );
}

#[test]
fn failed_load_pauses_the_queue() {
    let engine = engine();
    engine.element().fail_load.set(true);

    block_on(engine.load_track(track("a"), true));

    assert_eq!(engine.snapshot().status(), PlaybackStatus::Paused);
    assert_eq!(engine.element().play_calls(), 0);
    assert!(!engine.is_switching());
}

#[test]
fn overlapping_loads_resume_only_the_last_track() {
    let engine = engine();
    let gate = engine.element().hold_next_load();

    block_on(async {
        join!(
            engine.load_track(track("a"), true),
            engine.load_track(track("b"), true),
            async {
                let _ = gate.send(());
            },
        )
    });

    assert_eq!(engine.element().play_calls(), 1);
    assert!(engine.element().bound_uri().unwrap().contains("/Audio/b/"));
    assert_eq!(engine.snapshot().current_track, Some(track("b")));
    assert!(engine.element().playing.get());
    assert!(!engine.is_switching());
    assert_eq!(
        engine.pending_reports(),
        vec![started("a"), stop("a", Ticks::ZERO), started("b")]
    );
}

#[test]
fn clearing_cancels_an_in_flight_switch() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    block_on(engine.flush_reports());
    let source = hd();
    let gate = engine.element().hold_next_load();

    let (outcome, ()) = block_on(async {
        join!(engine.switch_source(&source), async {
            engine.clear_playback().await;
            let _ = gate.send(());
        })
    });

    assert_eq!(outcome, SwitchOutcome::Superseded);
    assert_eq!(engine.element().play_calls(), 1);
    assert!(!engine.element().playing.get());
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Empty);
    assert!(!engine.is_switching());
    assert_eq!(engine.element().bound_uri(), None);
    assert_eq!(engine.element().calls.borrow().last(), Some(&ElementCall::Clear));
    assert_eq!(engine.pending_reports(), vec![stop("a", Ticks::ZERO)]);
}

#[test]
fn pause_during_a_switch_becomes_the_resume_intent() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    engine.element().position.set(secs(40));
    let source = hd();
    let gate = engine.element().hold_next_load();

    let (outcome, ()) = block_on(async {
        join!(engine.switch_source(&source), async {
            engine.pause().await;
            let _ = gate.send(());
        })
    });

    assert_eq!(outcome, SwitchOutcome::LeftPaused);
    assert!(!engine.element().playing.get());
    assert_eq!(engine.element().position.get(), secs(40));
    assert_eq!(engine.element().play_calls(), 1);
    assert_eq!(engine.element().bound_uri().as_deref(), Some(source.uri.as_str()));
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Paused);
}

#[test]
fn seek_during_a_switch_becomes_the_restore_position() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    block_on(engine.flush_reports());
    engine.set_duration(secs(100));
    engine.element().position.set(secs(20));
    let source = hd();
    let gate = engine.element().hold_next_load();

    let (outcome, ()) = block_on(async {
        join!(engine.switch_source(&source), async {
            engine.seek(secs(70)).await;
            let _ = gate.send(());
        })
    });

    assert_eq!(outcome, SwitchOutcome::Resumed);
    assert_eq!(engine.element().position.get(), secs(70));
    let seeks: Vec<ElementCall> = engine
        .element()
        .calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, ElementCall::Seek(_)))
        .cloned()
        .collect();
    assert_eq!(
        seeks,
        vec![ElementCall::Seek(Ticks::ZERO), ElementCall::Seek(secs(70))]
    );
    assert_eq!(engine.pending_reports(), vec![progress("a", secs(70), false)]);
}

#[test]
fn seek_steps_use_the_configured_step() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    engine.set_duration(secs(100));
    engine.element().position.set(secs(20));

    block_on(engine.step_forward());
    assert_eq!(engine.element().position.get(), secs(30));
    assert_eq!(engine.snapshot().state.current_time, secs(30));

    block_on(engine.step_back());
    block_on(engine.step_back());
    block_on(engine.step_back());
    assert_eq!(engine.element().position.get(), Ticks::ZERO);
}

#[test]
fn progress_is_reported_once_per_interval_while_playing() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    block_on(engine.flush_reports());
    engine.set_duration(secs(100));
    let t0 = Instant::now();

    engine.tick(t0);
    engine.tick(t0 + Duration::from_secs(5));
    assert!(engine.pending_reports().is_empty());

    engine.element().position.set(secs(10));
    engine.tick(t0 + Duration::from_secs(10));
    assert_eq!(engine.pending_reports(), vec![progress("a", secs(10), false)]);

    engine.tick(t0 + Duration::from_secs(15));
    assert_eq!(engine.pending_reports().len(), 1);
}

#[test]
fn paused_playback_does_not_tick_reports() {
    let engine = engine();
    block_on(engine.load_track(track("a"), false));
    block_on(engine.flush_reports());
    let t0 = Instant::now();

    engine.tick(t0);
    engine.tick(t0 + Duration::from_secs(60));

    assert!(engine.pending_reports().is_empty());
}

#[test]
fn zero_interval_disables_periodic_reports() {
    let mut settings = Settings::default();
    settings.reporting.progress_interval_secs = 0;
    let (engine, _) = engine_with(&settings, FakeCatalog::default());
    block_on(engine.load_track(track("a"), true));
    block_on(engine.flush_reports());
    let t0 = Instant::now();

    engine.tick(t0);
    engine.tick(t0 + Duration::from_secs(600));

    assert!(engine.pending_reports().is_empty());
}

#[test]
fn track_end_moves_the_element_to_the_next_track() {
    let engine = engine();
    block_on(engine.load_queue(tracks(&["a", "b"]), 0, true));

    block_on(engine.track_ended());

    assert!(engine.element().bound_uri().unwrap().contains("/Audio/b/"));
    assert!(engine.element().playing.get());
    assert_eq!(engine.element().play_calls(), 2);
}

#[test]
fn track_end_with_repeat_replays_the_same_source() {
    let engine = engine();
    block_on(engine.load_queue(tracks(&["a", "b"]), 0, true));
    block_on(engine.flush_reports());
    engine.set_repeat(true);
    engine.set_duration(secs(90));
    engine.element().position.set(secs(90));
    engine.element().playing.set(false);
    let bound = engine.element().bound_uri();

    block_on(engine.track_ended());

    assert_eq!(engine.snapshot().current_index, Some(0));
    assert_eq!(engine.element().bound_uri(), bound);
    assert_eq!(engine.element().position.get(), Ticks::ZERO);
    assert!(engine.element().playing.get());
    assert_eq!(engine.element().play_calls(), 2);
    assert_eq!(engine.pending_reports(), vec![progress("a", Ticks::ZERO, false)]);
}

#[test]
fn superseded_resume_does_not_pause_the_new_track() {
    let engine = engine();
    block_on(engine.load_track(track("a"), true));
    let source = hd();
    let release_play = engine.element().hold_next_play();

    let (outcome, ()) = block_on(async {
        join!(engine.switch_source(&source), async {
            engine.load_track(track("b"), true).await;
            engine.element().reject_play.set(true);
            let _ = release_play.send(());
        })
    });

    assert_eq!(outcome, SwitchOutcome::Superseded);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.current_track, Some(track("b")));
    assert_eq!(snapshot.status(), PlaybackStatus::Playing);
    assert!(engine.element().bound_uri().unwrap().contains("/Audio/b/"));
    assert!(!engine.is_switching());
}

#[test]
fn media_controls_map_onto_engine_operations() {
    let engine = engine();
    block_on(engine.load_queue(tracks(&["a", "b"]), 0, true));

    assert!(!block_on(engine.apply_control(ControlCmd::Next)));
    assert_eq!(engine.snapshot().current_index, Some(1));

    block_on(engine.apply_control(ControlCmd::SetShuffle(true)));
    block_on(engine.apply_control(ControlCmd::SetShuffle(true)));
    assert!(engine.snapshot().state.shuffle);

    block_on(engine.apply_control(ControlCmd::SetRepeat(true)));
    block_on(engine.apply_control(ControlCmd::SetVolume(0.8)));
    let state = engine.snapshot().state;
    assert!(state.repeat);
    assert_eq!(state.volume, 0.8);

    block_on(engine.apply_control(ControlCmd::Pause));
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Paused);
    assert!(!engine.element().playing.get());

    block_on(engine.apply_control(ControlCmd::Stop));
    assert_eq!(engine.snapshot().status(), PlaybackStatus::Empty);

    assert!(block_on(engine.apply_control(ControlCmd::Quit)));
}
