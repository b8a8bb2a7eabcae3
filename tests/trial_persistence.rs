//! Trial gating across application launches, backed by a real file

use mymusic_metronome::config::TrialConfig;
use mymusic_metronome::trial::gate::{SESSION_COUNT_KEY, UPGRADED_KEY};
use mymusic_metronome::{
    JsonFileStore, KeyValueStore, MetronomeConfig, RecordingSink, SessionGate, Transport,
};
use tempfile::TempDir;

fn trial() -> TrialConfig {
    TrialConfig {
        session_limit: 3,
        trial_seconds: 2,
        slowdown_step: 5,
    }
}

/// One application start: open the store and count the session
fn launch(path: &std::path::Path) -> (JsonFileStore, SessionGate) {
    let mut store = JsonFileStore::open(path).unwrap();
    let gate = SessionGate::register(&mut store, &trial()).unwrap();
    (store, gate)
}

#[test]
fn test_trial_expires_after_session_limit() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");

    for expected in 1..=3 {
        let (_, gate) = launch(&path);
        assert_eq!(gate.session_count, expected);
        assert!(!gate.is_restricted());
    }

    let (store, gate) = launch(&path);
    assert!(gate.trial_expired);
    assert!(gate.is_restricted());
    assert_eq!(store.get(SESSION_COUNT_KEY).as_deref(), Some("4"));
}

#[test]
fn test_expired_session_slows_down_and_prompts() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    for _ in 0..3 {
        launch(&path);
    }
    let (_, gate) = launch(&path);

    let config = MetronomeConfig {
        trial: trial(),
        ..MetronomeConfig::default()
    };
    let mut transport = Transport::new(config, gate, RecordingSink::new(), 0.0);
    transport.play(0.0);

    let mut now = 0.0;
    while transport.is_playing() && now < 600_000.0 {
        transport.tick(now);
        now += 10.0;
    }

    assert!(!transport.is_playing());
    assert_eq!(transport.tempo().bpm(), 120);
    assert!(transport.upgrade_prompt());
}

#[test]
fn test_upgrade_persists_across_launches() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    for _ in 0..3 {
        launch(&path);
    }

    let (mut store, gate) = launch(&path);
    let config = MetronomeConfig {
        trial: trial(),
        ..MetronomeConfig::default()
    };
    let mut transport = Transport::new(config, gate, RecordingSink::new(), 0.0);
    transport.mark_upgraded(&mut store).unwrap();
    assert!(!transport.gate().is_restricted());

    transport.play(0.0);
    let mut now = 0.0;
    while now < 10_000.0 {
        transport.tick(now);
        now += 10.0;
    }
    assert!(transport.is_playing());
    assert!(!transport.is_slowing_down());

    let (store, gate) = launch(&path);
    assert!(gate.has_upgraded);
    assert!(!gate.is_restricted());
    assert_eq!(store.get(UPGRADED_KEY).as_deref(), Some("true"));
}

#[test]
fn test_corrupt_store_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(JsonFileStore::open(&path).is_err());
}
