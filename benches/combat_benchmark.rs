//! Performance benchmarks for the combat engine
//!
//! Measures, using Criterion.rs:
//!
//! 1. **Arithmetic** - mixed-number sums and simplification
//! 2. **Notation** - parsing operations from text
//! 3. **Battle** - whole headless battles with a perfect player
//! 4. **Batch** - parallel batches of seeded battles

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mixed_combat::{
    core::{parse_operation, MixedNumber},
    game::{agent::ZeroController, Arena, CombatLogger, VerbosityLevel},
    loader::{BattleConfig, ConfigLoader},
    simulate::{run_batch, BatchOptions},
};
use std::time::Duration;

fn default_battle() -> Option<BattleConfig> {
    match ConfigLoader::default_battle() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Skipping benchmark - failed to load battle: {}", e);
            None
        }
    }
}

/// Benchmark: sum a run of fractions with unlike denominators, then simplify
fn bench_arithmetic(c: &mut Criterion) {
    let numbers: Vec<MixedNumber> = (1..=12)
        .map(|d| MixedNumber::new(d % 2 == 0, d % 3, 1, d))
        .collect();

    c.bench_function("mixed_number_sum", |b| {
        b.iter(|| {
            let sum: MixedNumber = black_box(&numbers).iter().copied().sum();
            sum.simplified()
        })
    });
}

/// Benchmark: parse and evaluate an operation
fn bench_notation(c: &mut Criterion) {
    c.bench_function("parse_operation", |b| {
        b.iter(|| {
            let ops = parse_operation(black_box("{1/2, 3/4} + 1 1/3 - 2/5 + _"))
                .expect("Operation should parse");
            ops.evaluate()
        })
    });
}

/// Benchmark: one battle from start to victory
fn bench_battle(c: &mut Criterion) {
    let Some(config) = default_battle() else {
        return;
    };

    let mut group = c.benchmark_group("battle_execution");
    group.sample_size(20);

    let seed = 42u64;
    group.bench_with_input(BenchmarkId::new("zero", seed), &seed, |b, &seed| {
        b.iter(|| {
            let logger = CombatLogger::with_verbosity(VerbosityLevel::Silent);
            let mut arena =
                Arena::new(&config, black_box(seed), logger).expect("Battle should build");
            arena.run(&mut ZeroController::new())
        });
    });

    group.finish();
}

/// Benchmark: a parallel batch of battles
fn bench_batch(c: &mut Criterion) {
    let Some(config) = default_battle() else {
        return;
    };

    let mut group = c.benchmark_group("batch_execution");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for battles in [16usize, 64] {
        let options = BatchOptions {
            battles,
            seed: 42,
            ..BatchOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("zero", battles), &options, |b, options| {
            b.iter(|| run_batch(&config, options).expect("Batch should complete"));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_arithmetic,
    bench_notation,
    bench_battle,
    bench_batch
);
criterion_main!(benches);
