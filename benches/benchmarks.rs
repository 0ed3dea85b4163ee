//! Benchmark suite for clickguard.
//!
//! - Loop detection over full history windows
//! - Tracker bookkeeping and strategy selection
//! - Whole requests through the controller against the simulated desktop
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- --save-baseline main
//! cargo bench -- --baseline main
//! ```

use clickguard::interaction::{AttemptOutcome, FailureReason};
use clickguard::testing::{MockDesktop, TargetBehavior};
use clickguard::{
    Action, ActionHistory, Controller, GuardConfig, InteractionRequest, InteractionTracker,
    Location, LoopDetector, Strategy, StrategySelector,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ============================================================================
// Loop Detection Benchmarks
// ============================================================================

fn bench_loop_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("loop_detection");
    let detector = LoopDetector::default();

    for capacity in [20usize, 100, 500] {
        let mut history = ActionHistory::new(capacity);
        for i in 0..capacity {
            history.append(
                Action::new("Click")
                    .with_param("x", (i % 7) as i64)
                    .with_param("y", (i % 11) as i64),
            );
        }
        let candidate = Action::new("Click").with_param("x", 0).with_param("y", 0);

        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("detect_with", capacity),
            &history,
            |b, history| b.iter(|| detector.detect_with(black_box(history), black_box(&candidate))),
        );
    }

    group.finish();
}

// ============================================================================
// Tracker Benchmarks
// ============================================================================

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker");
    let selector = StrategySelector::new();
    let failure = AttemptOutcome::failure(FailureReason::NoStateChange);

    for locations in [10i32, 1_000] {
        group.bench_with_input(
            BenchmarkId::new("record_and_select", locations),
            &locations,
            |b, &locations| {
                b.iter(|| {
                    let mut tracker = InteractionTracker::default();
                    for i in 0..locations {
                        let location = Location::new(i, i);
                        tracker.record_outcome(location, Strategy::Direct, &failure);
                        black_box(selector.select(&tracker, location, Some(Strategy::Direct)));
                    }
                    tracker
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Controller Benchmarks
// ============================================================================

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller");
    let target = Location::new(100, 100);

    for strategy in [Strategy::Direct, Strategy::TextSelect] {
        group.bench_function(BenchmarkId::new("submit", strategy.name()), |b| {
            b.iter(|| {
                let desktop = MockDesktop::new().with_target(TargetBehavior::new(target, [strategy]));
                let mut controller =
                    Controller::new(desktop.clone(), desktop, GuardConfig::default())
                        .expect("default config is valid");
                controller.submit(black_box(InteractionRequest::click(target).with_text("OK")))
            })
        });
    }

    group.bench_function("submit_exhausted", |b| {
        b.iter(|| {
            let desktop = MockDesktop::new();
            let mut controller = Controller::new(desktop.clone(), desktop, GuardConfig::default())
                .expect("default config is valid");
            controller.submit(black_box(InteractionRequest::click(target)))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_loop_detection, bench_tracker, bench_controller);
criterion_main!(benches);
