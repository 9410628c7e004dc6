//! Benchmarks for streaming reversal detection.

use candle_reversal::prelude::*;
use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate a deterministic wandering bar series
fn generate_bars(n: usize) -> Vec<Candle> {
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = price + change;
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;
    let ts = DateTime::<Utc>::from_timestamp(1_700_000_000 + i as i64 * 60, 0).unwrap_or_default();

    bars.push(Candle::new(o, h, l, c, 1000.0, ts));
    price = c.max(1.0);
  }

  bars
}

fn bench_single_detector(c: &mut Criterion) {
  let bars = generate_bars(1000);

  c.bench_function("hammer_1000_bars", |b| {
    b.iter(|| {
      let mut hammer = HammerDetector::with_defaults();
      for bar in &bars {
        let _ = black_box(hammer.detect_candle("BENCH", black_box(*bar)));
      }
    })
  });
}

fn bench_all_patterns(c: &mut Criterion) {
  let bars = generate_bars(1000);

  c.bench_function("engine_all_patterns_1000_bars", |b| {
    b.iter(|| {
      let mut engine = EngineBuilder::new().with_all_defaults().build().unwrap();
      for bar in &bars {
        let _ = black_box(engine.on_bar("BENCH", black_box(*bar)));
      }
    })
  });
}

fn bench_trend_periods(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let mut group = c.benchmark_group("trend_periods");

  for periods in [5usize, 10, 20] {
    let config = HammerConfig {
      trend: TrendConfig { trend_periods: Period::new(periods).unwrap(), ..TrendConfig::default() },
      ..HammerConfig::default()
    };

    group.bench_with_input(BenchmarkId::from_parameter(periods), &bars, |b, bars| {
      b.iter(|| {
        let mut hammer = HammerDetector::new(config).unwrap();
        for bar in bars {
          let _ = black_box(hammer.detect_candle("BENCH", *bar));
        }
      })
    });
  }

  group.finish();
}

fn bench_parallel_scan(c: &mut Criterion) {
  let series: Vec<(String, Vec<Candle>)> =
    (0..16).map(|i| (format!("SYM{i}"), generate_bars(1000))).collect();

  c.bench_function("scan_parallel_16x1000", |b| {
    b.iter(|| {
      let instruments: Vec<(&str, &[Candle])> =
        series.iter().map(|(s, bars)| (s.as_str(), bars.as_slice())).collect();
      black_box(scan_parallel(|| EngineBuilder::new().with_all_defaults().build(), instruments))
    })
  });
}

criterion_group!(
  benches,
  bench_single_detector,
  bench_all_patterns,
  bench_trend_periods,
  bench_parallel_scan
);
criterion_main!(benches);
