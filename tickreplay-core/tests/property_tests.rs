//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Window invariant: buffer length == min(ticks seen, W)
//! 2. Signal mutual exclusivity: at most one signal per tick per instrument
//! 3. Equity continuity: curve is time-ordered and has one sample per fill
//! 4. Idempotent replay: identical input gives identical output
//! 5. Long-only alternation: orders per instrument alternate BUY, SELL

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use tickreplay_core::data::VecSource;
use tickreplay_core::domain::{Direction, Tick};
use tickreplay_core::engine::{AuditEntry, Backtest};
use tickreplay_core::strategy::Strategy as _;
use tickreplay_core::strategy::{BollingerBands, BollingerParams};
use tickreplay_core::EngineConfig;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bids(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-50i32..50, 1..max_len).prop_map(|steps| {
        let mut bid = 1.30_f64;
        steps
            .into_iter()
            .map(|s| {
                bid = (bid + s as f64 * 0.0001).max(0.01);
                (bid * 100_000.0).round() / 100_000.0
            })
            .collect()
    })
}

fn arb_params() -> impl Strategy<Value = BollingerParams> {
    (1usize..30, 0.25..3.0_f64).prop_map(|(window, std_factor)| BollingerParams {
        window,
        std_factor,
    })
}

fn to_ticks(bids: &[f64], instruments: &[&str]) -> Vec<Tick> {
    let base = Utc.with_ymd_and_hms(2014, 1, 2, 0, 0, 0).unwrap();
    bids.iter()
        .enumerate()
        .map(|(i, &bid)| {
            let instrument = instruments[i % instruments.len()];
            Tick::new(instrument, base + Duration::seconds(i as i64), bid, bid + 0.0002)
        })
        .collect()
}

fn config(instruments: &[&str], params: BollingerParams) -> EngineConfig {
    EngineConfig::new(
        instruments.iter().map(|s| s.to_string()).collect(),
        params,
        100_000.0,
    )
}

const PAIRS: [&str; 2] = ["EURUSD", "GBPUSD"];

proptest! {
    #[test]
    fn window_length_is_min_of_ticks_and_w(bids in arb_bids(200), params in arb_params()) {
        let instruments: Vec<String> = PAIRS.iter().map(|s| s.to_string()).collect();
        let mut strategy = BollingerBands::new(&instruments, params);
        let mut seen: HashMap<String, usize> = HashMap::new();

        for tick in to_ticks(&bids, &PAIRS) {
            strategy.on_tick(&tick).unwrap();
            let n = seen.entry(tick.instrument.clone()).or_default();
            *n += 1;
            let state = strategy.state(&tick.instrument).unwrap();
            prop_assert_eq!(state.window().len(), (*n).min(params.window));
            prop_assert_eq!(state.ticks(), *n as u64);
        }
    }

    #[test]
    fn at_most_one_signal_per_tick(bids in arb_bids(300), params in arb_params()) {
        let instruments: Vec<String> = PAIRS.iter().map(|s| s.to_string()).collect();
        let mut strategy = BollingerBands::new(&instruments, params);
        for tick in to_ticks(&bids, &PAIRS) {
            let signals = strategy.on_tick(&tick).unwrap();
            prop_assert!(signals.len() <= 1);
            for s in &signals {
                prop_assert_eq!(&s.instrument, &tick.instrument);
                prop_assert_eq!(s.timestamp, tick.timestamp);
            }
        }
    }

    #[test]
    fn equity_curve_has_one_ordered_sample_per_fill(bids in arb_bids(300), params in arb_params()) {
        let cfg = config(&PAIRS, params);
        let result = Backtest::new(&cfg, Box::new(VecSource::new(to_ticks(&bids, &PAIRS))))
            .unwrap()
            .run()
            .unwrap();

        prop_assert_eq!(result.equity_curve.len() as u64, result.stats.fills);
        prop_assert!(result.equity_curve.is_sealed());
        let points = result.equity_curve.points();
        for pair in points.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn replay_is_deterministic(bids in arb_bids(300), params in arb_params()) {
        let cfg = config(&PAIRS, params);
        let ticks = to_ticks(&bids, &PAIRS);
        let a = Backtest::new(&cfg, Box::new(VecSource::new(ticks.clone())))
            .unwrap()
            .run()
            .unwrap();
        let b = Backtest::new(&cfg, Box::new(VecSource::new(ticks)))
            .unwrap()
            .run()
            .unwrap();

        prop_assert_eq!(&a.audit_log, &b.audit_log);
        prop_assert_eq!(a.equity_curve.points(), b.equity_curve.points());
        prop_assert_eq!(a.final_equity.to_bits(), b.final_equity.to_bits());
    }

    #[test]
    fn orders_alternate_buy_sell_per_instrument(bids in arb_bids(300), params in arb_params()) {
        let cfg = config(&PAIRS, params);
        let result = Backtest::new(&cfg, Box::new(VecSource::new(to_ticks(&bids, &PAIRS))))
            .unwrap()
            .run()
            .unwrap();

        let mut last: HashMap<&str, Direction> = HashMap::new();
        for record in &result.audit_log {
            if let AuditEntry::Order { direction, .. } = record.entry {
                let expected = last
                    .get(record.instrument.as_str())
                    .map(|d| d.opposite())
                    .unwrap_or(Direction::Buy);
                prop_assert_eq!(direction, expected);
                last.insert(record.instrument.as_str(), direction);
            }
        }
        for position in &result.positions {
            prop_assert!(position.quantity >= 0.0);
        }
    }
}
