use eframe::egui;
use mymusic_metronome::config::default_config_path;
use mymusic_metronome::sequencer::Clock;
use mymusic_metronome::ui::app::MetronomeApp;
use mymusic_metronome::{
    AudioEngine, FrameTicks, JsonFileStore, KeyValueStore, MemoryStore, MetronomeConfig,
    MonotonicClock, SessionGate, Transport,
};

fn load_config() -> MetronomeConfig {
    let Some(path) = default_config_path() else {
        log::warn!("No config directory, using default settings");
        return MetronomeConfig::default();
    };

    match MetronomeConfig::load(&path) {
        Ok(config) => {
            log::info!("Config loaded from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Invalid config {}: {}, using defaults", path.display(), e);
            MetronomeConfig::default()
        }
    }
}

fn open_store() -> Box<dyn KeyValueStore> {
    match JsonFileStore::open_default() {
        Ok(store) => {
            log::debug!("Session store: {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            log::warn!("Session store unavailable ({}), counters won't persist", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn main() {
    env_logger::init();

    let config = load_config();
    let mut store = open_store();

    let gate = match SessionGate::register(store.as_mut(), &config.trial) {
        Ok(gate) => gate,
        Err(e) => {
            log::warn!("Could not record session: {}", e);
            SessionGate::unrestricted()
        }
    };

    // No sound is not fatal: beats keep firing and animating
    let audio = match AudioEngine::new() {
        Ok(engine) => Some(engine),
        Err(e) => {
            log::warn!("Audio disabled: {}", e);
            None
        }
    };

    let ticks = FrameTicks::new(MonotonicClock::new());
    let transport = Transport::new(config, gate, audio, ticks.clock().now_ms());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([360.0, 560.0])
            .with_title("MyMusic Metronome"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "MyMusic Metronome",
        native_options,
        Box::new(|_cc| Ok(Box::new(MetronomeApp::new(transport, ticks, store)))),
    ) {
        log::error!("UI error: {}", e);
    }
}
