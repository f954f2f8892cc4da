//! Backtest engine: the event loop, run failures, audit log and observers.
//!
//! The driver owns the queue, the quote book and every component. Components
//! never call each other; the driver routes each event to exactly one
//! consumer:
//!
//! - TICK -> strategy (after the quote book is updated)
//! - SIGNAL -> portfolio
//! - ORDER -> execution
//! - FILL -> portfolio

pub mod audit;
pub mod driver;
pub mod failure;
pub mod observer;

pub use audit::{AuditEntry, AuditLog, AuditRecord};
pub use driver::{Backtest, DriverState, RunResult, RunStats};
pub use failure::{Component, EngineError, RunFailure};
pub use observer::{EventObserver, MemorySink, OutputSink, TracingObserver};
