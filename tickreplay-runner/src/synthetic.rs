//! Synthetic tick generation for demos and tests.
//!
//! Each instrument gets its own RNG seeded from BLAKE3 of `seed` and the
//! instrument name, so adding an instrument never changes another's prices.
//! Results on synthetic data are tagged as such in the run manifest.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickreplay_core::data::MergedSource;
use tickreplay_core::domain::{Symbol, Tick};

/// Fixed start so generated data is identical across machines and days.
fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn instrument_rng(instrument: &str, seed: u64) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(instrument.as_bytes());
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// `n` ticks per instrument as a merged, time-ordered stream.
///
/// Bids follow a multiplicative random walk starting at 1.0 + 0.25 per
/// instrument index; spreads are 1-3 pips; ticks arrive every 100-900 ms.
pub fn synthetic_ticks(instruments: &[Symbol], n: usize, seed: u64) -> Vec<Tick> {
    let streams = instruments
        .iter()
        .enumerate()
        .map(|(i, instrument)| {
            let mut rng = instrument_rng(instrument, seed);
            let mut bid = 1.0 + 0.25 * i as f64;
            let mut ts = epoch();
            (0..n)
                .map(|_| {
                    ts += Duration::milliseconds(rng.gen_range(100..=900));
                    bid *= 1.0 + rng.gen_range(-0.0005..0.0005);
                    let spread = rng.gen_range(1..=3) as f64 * 0.0001;
                    let bid_rounded = (bid * 100_000.0).round() / 100_000.0;
                    Tick::new(instrument.as_str(), ts, bid_rounded, bid_rounded + spread)
                })
                .collect()
        })
        .collect();
    MergedSource::new(streams).into_vec()
}
