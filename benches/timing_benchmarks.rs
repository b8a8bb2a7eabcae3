use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mymusic_metronome::sequencer::metronome::{BeatTracker, PendulumTracker};
use mymusic_metronome::sequencer::tap_tempo::TapTempo;
use mymusic_metronome::{
    FrameTicks, MetronomeConfig, RecordingSink, SessionGate, SteppedClock, Tempo, Transport,
    Variant,
};

/// Benchmark beat sampling (runs on every display frame)
fn bench_beat_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("beat_tracker");

    for bpm in [30u16, 120, 240] {
        let tempo = Tempo::new(bpm);
        group.bench_with_input(BenchmarkId::from_parameter(bpm), &tempo, |b, &tempo| {
            let mut tracker = BeatTracker::new(0.0);
            let mut now = 0.0;
            b.iter(|| {
                now += 16.7;
                black_box(tracker.sample(black_box(now), tempo));
            });
        });
    }
    group.finish();
}

fn bench_pendulum_sampling(c: &mut Criterion) {
    let tempo = Tempo::new(120);
    let anchor = BeatTracker::new(0.0);
    let mut pendulum = PendulumTracker::new(30.0);
    let mut now = 0.0;

    c.bench_function("pendulum_sample", |b| {
        b.iter(|| {
            now += 16.7;
            black_box(pendulum.sample(black_box(now), tempo, anchor.anchor()));
        });
    });
}

/// Benchmark the full per-frame path: timers, trackers, zoom and view
fn bench_transport_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("transport_tick");

    for variant in [Variant::Circular, Variant::Pendulum] {
        let config = MetronomeConfig {
            variant,
            ..MetronomeConfig::default()
        };
        let mut transport =
            Transport::new(config, SessionGate::unrestricted(), RecordingSink::new(), 0.0);
        transport.play(0.0);
        let mut ticks = FrameTicks::new(SteppedClock::at_refresh_rate(0.0, 120.0));

        group.bench_function(format!("{:?}", variant), |b| {
            b.iter(|| {
                let now = ticks.next().unwrap_or_default();
                black_box(transport.tick(now));
                // Keep the recorded clicks from growing without bound
                transport.audio_mut().tones.clear();
            });
        });
    }
    group.finish();
}

fn bench_tap_estimate(c: &mut Criterion) {
    let mut tap_tempo = TapTempo::new();
    for i in 0..8 {
        tap_tempo.tap(i as f64 * 500.0);
    }

    c.bench_function("tap_estimate", |b| {
        b.iter(|| black_box(tap_tempo.estimate_bpm()));
    });
}

criterion_group!(
    benches,
    bench_beat_sampling,
    bench_pendulum_sampling,
    bench_transport_tick,
    bench_tap_estimate
);
criterion_main!(benches);
