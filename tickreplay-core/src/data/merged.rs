//! K-way merge of per-instrument tick streams.

use super::{PriceSource, SourceError};
use crate::domain::Tick;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct HeadKey {
    timestamp: DateTime<Utc>,
    instrument: String,
    stream: usize,
}

/// Merges several individually time-ordered tick vectors into one stream
/// ordered by `(timestamp, instrument)`.
///
/// Order within a stream is preserved. Streams are not re-sorted; a stream
/// that goes backwards in time surfaces as a non-monotonic tick downstream.
#[derive(Debug)]
pub struct MergedSource {
    streams: Vec<std::vec::IntoIter<Tick>>,
    pending: Vec<Option<Tick>>,
    heads: BinaryHeap<Reverse<HeadKey>>,
}

impl MergedSource {
    pub fn new(streams: Vec<Vec<Tick>>) -> Self {
        let mut merged = Self {
            streams: streams.into_iter().map(Vec::into_iter).collect(),
            pending: Vec::new(),
            heads: BinaryHeap::new(),
        };
        merged.pending = vec![None; merged.streams.len()];
        for idx in 0..merged.streams.len() {
            merged.advance(idx);
        }
        merged
    }

    fn advance(&mut self, stream: usize) {
        if let Some(tick) = self.streams[stream].next() {
            self.heads.push(Reverse(HeadKey {
                timestamp: tick.timestamp,
                instrument: tick.instrument.clone(),
                stream,
            }));
            self.pending[stream] = Some(tick);
        }
    }

    /// Drain the whole merged stream into a vector.
    pub fn into_vec(mut self) -> Vec<Tick> {
        let mut out = Vec::new();
        while let Some(tick) = self.pop() {
            out.push(tick);
        }
        out
    }

    fn pop(&mut self) -> Option<Tick> {
        let Reverse(head) = self.heads.pop()?;
        let tick = self.pending[head.stream].take();
        self.advance(head.stream);
        tick
    }
}

impl PriceSource for MergedSource {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        Ok(self.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn tick(inst: &str, secs: i64, bid: f64) -> Tick {
        let base = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        Tick::new(inst, base + Duration::seconds(secs), bid, bid + 0.0002)
    }

    #[test]
    fn merges_by_timestamp() {
        let gbp = vec![tick("GBPUSD", 0, 1.5), tick("GBPUSD", 2, 1.6)];
        let eur = vec![tick("EURUSD", 1, 1.3), tick("EURUSD", 3, 1.4)];
        let out = MergedSource::new(vec![gbp, eur]).into_vec();
        let order: Vec<_> = out.iter().map(|t| t.instrument.as_str()).collect();
        assert_eq!(order, vec!["GBPUSD", "EURUSD", "GBPUSD", "EURUSD"]);
    }

    #[test]
    fn ties_break_by_instrument_name() {
        let gbp = vec![tick("GBPUSD", 0, 1.5)];
        let eur = vec![tick("EURUSD", 0, 1.3)];
        let out = MergedSource::new(vec![gbp, eur]).into_vec();
        assert_eq!(out[0].instrument, "EURUSD");
        assert_eq!(out[1].instrument, "GBPUSD");
    }

    #[test]
    fn equal_timestamps_within_stream_keep_order() {
        let eur = vec![tick("EURUSD", 0, 1.1), tick("EURUSD", 0, 1.2), tick("EURUSD", 0, 1.3)];
        let out = MergedSource::new(vec![eur]).into_vec();
        let bids: Vec<f64> = out.iter().map(|t| t.bid).collect();
        assert_eq!(bids, vec![1.1, 1.2, 1.3]);
    }

    #[test]
    fn empty_streams_end_immediately() {
        let mut src = MergedSource::new(vec![vec![], vec![]]);
        assert!(src.next_tick().unwrap().is_none());
    }
}
