//! Price sources and the quote book.
//!
//! The `PriceSource` trait abstracts over where ticks come from (CSV files,
//! in-memory vectors, synthetic generators) so the driver can replay any of
//! them. Sources must deliver one globally timestamp-ordered stream; ties are
//! broken by instrument name ascending.

pub mod merged;
pub mod quotes;

pub use merged::MergedSource;
pub use quotes::{Quote, QuoteBook};

use crate::domain::Tick;
use thiserror::Error;

/// Failure raised by a `PriceSource` implementation.
///
/// The bundled sources are infallible; streaming sources outside this crate
/// report read or parse failures through it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("price source failed: {0}")]
    Failed(String),
}

/// Chronological tick stream.
///
/// `Ok(None)` is the end-of-stream signal; a source must keep returning it
/// once exhausted.
pub trait PriceSource {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError>;
}

/// Replays a pre-ordered vector of ticks.
#[derive(Debug, Clone)]
pub struct VecSource {
    ticks: std::vec::IntoIter<Tick>,
}

impl VecSource {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks: ticks.into_iter(),
        }
    }
}

impl PriceSource for VecSource {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        Ok(self.ticks.next())
    }
}

impl<S: PriceSource + ?Sized> PriceSource for Box<S> {
    fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        (**self).next_tick()
    }
}
