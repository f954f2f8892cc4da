//! Backtest driver: the single-threaded event loop.
//!
//! One tick is admitted from the price source only when the queue is empty,
//! so every signal, order and fill derived from a tick is resolved before the
//! next tick is seen. Each `step()` dispatches at most one event.

use super::audit::{AuditLog, AuditRecord};
use super::failure::{Component, EngineError, RunFailure};
use super::observer::{EventObserver, OutputSink};
use crate::config::{ConfigError, EngineConfig};
use crate::data::{PriceSource, QuoteBook};
use crate::domain::{EquityCurve, EquityPoint, Position, Symbol, Tick};
use crate::events::{Event, EventQueue};
use crate::execution::{ExecutionHandler, SimulatedExecution};
use crate::portfolio::{Portfolio, SignalDecision};
use crate::strategy::{BollingerBands, Strategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverState {
    /// Pulling ticks from the source.
    Running,
    /// Source exhausted; resolving the events still queued.
    Draining,
    /// Queue empty after exhaustion. The equity curve is sealed.
    Done,
    /// A component failed; the run will not continue.
    Halted,
}

/// Event counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub ticks: u64,
    pub signals: u64,
    pub suppressed: u64,
    pub orders: u64,
    pub fills: u64,
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub strategy: String,
    pub equity_curve: EquityCurve,
    pub audit_log: Vec<AuditRecord>,
    pub initial_equity: f64,
    /// Equity with open positions marked at their last bid.
    pub final_equity: f64,
    pub realized_pnl: f64,
    pub costs_paid: f64,
    /// Final positions, in instrument order.
    pub positions: Vec<Position>,
    pub stats: RunStats,
}

impl RunResult {
    pub fn total_return(&self) -> f64 {
        if self.initial_equity > 0.0 {
            self.final_equity / self.initial_equity - 1.0
        } else {
            0.0
        }
    }

    pub fn write_to<S: OutputSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        sink.write_run(&self.equity_curve, &self.audit_log)
    }
}

pub struct Backtest {
    instruments: HashSet<Symbol>,
    source: Box<dyn PriceSource>,
    strategy: Box<dyn Strategy>,
    portfolio: Portfolio,
    execution: Box<dyn ExecutionHandler>,
    queue: EventQueue,
    quotes: QuoteBook,
    audit: AuditLog,
    observers: Vec<Box<dyn EventObserver>>,
    state: DriverState,
    halted_by: Option<Component>,
    last_tick_time: Option<DateTime<Utc>>,
    stats: RunStats,
    initial_equity: f64,
}

impl Backtest {
    /// Driver with the Bollinger strategy and the simulated execution handler.
    pub fn new(config: &EngineConfig, source: Box<dyn PriceSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = BollingerBands::new(&config.instruments, config.strategy);
        let execution = SimulatedExecution::new(config.costs);
        Self::with_components(config, source, Box::new(strategy), Box::new(execution))
    }

    pub fn with_components(
        config: &EngineConfig,
        source: Box<dyn PriceSource>,
        strategy: Box<dyn Strategy>,
        execution: Box<dyn ExecutionHandler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            instruments: config.instruments.iter().cloned().collect(),
            source,
            strategy,
            portfolio: Portfolio::new(
                &config.instruments,
                config.initial_equity,
                config.sizing,
                config.equity_sampling,
            ),
            execution,
            queue: EventQueue::new(),
            quotes: QuoteBook::new(),
            audit: AuditLog::new(),
            observers: Vec::new(),
            state: DriverState::Running,
            halted_by: None,
            last_tick_time: None,
            stats: RunStats::default(),
            initial_equity: config.initial_equity,
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn EventObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Box<dyn EventObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn quotes(&self) -> &QuoteBook {
        &self.quotes
    }

    pub fn audit_log(&self) -> &[AuditRecord] {
        self.audit.records()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Advance by one event.
    ///
    /// While running and with an empty queue, the next tick is pulled from
    /// the source first. Stepping a `Done` or `Halted` driver is a no-op.
    pub fn step(&mut self) -> Result<DriverState, RunFailure> {
        if matches!(self.state, DriverState::Done | DriverState::Halted) {
            return Ok(self.state);
        }

        if self.queue.is_empty() && self.state == DriverState::Running {
            match self.source.next_tick() {
                Ok(Some(tick)) => {
                    self.admit(tick)?;
                }
                Ok(None) => {
                    tracing::debug!(ticks = self.stats.ticks, "price source exhausted");
                    self.state = DriverState::Draining;
                }
                Err(e) => return Err(self.halt(Component::PriceSource, None, e)),
            }
        }

        if let Some(event) = self.queue.pop() {
            self.dispatch(event)?;
        }

        if self.state == DriverState::Draining && self.queue.is_empty() {
            self.portfolio.seal();
            self.state = DriverState::Done;
        }
        Ok(self.state)
    }

    /// Step until the run completes or fails.
    pub fn run(&mut self) -> Result<RunResult, RunFailure> {
        if let Some(component) = self.halted_by {
            return Err(RunFailure::new(
                component,
                None,
                self.last_equity(),
                EngineError::Halted,
            ));
        }

        tracing::info!(
            strategy = self.strategy.name(),
            execution = self.execution.name(),
            instruments = self.instruments.len(),
            "backtest started"
        );
        while self.step()? != DriverState::Done {}

        let result = self.result();
        tracing::info!(
            ticks = result.stats.ticks,
            signals = result.stats.signals,
            fills = result.stats.fills,
            final_equity = result.final_equity,
            "backtest complete"
        );
        Ok(result)
    }

    /// Snapshot of the run so far; complete once the driver is `Done`.
    pub fn result(&self) -> RunResult {
        let positions = self
            .portfolio
            .positions()
            .into_values()
            .cloned()
            .collect();
        RunResult {
            strategy: self.strategy.name().to_string(),
            equity_curve: self.portfolio.equity_curve().clone(),
            audit_log: self.audit.records().to_vec(),
            initial_equity: self.initial_equity,
            final_equity: self.portfolio.equity(&self.quotes),
            realized_pnl: self.portfolio.accounting().realized_pnl(),
            costs_paid: self.portfolio.accounting().costs_paid(),
            positions,
            stats: self.stats,
        }
    }

    fn admit(&mut self, tick: Tick) -> Result<(), RunFailure> {
        if let Err(e) = tick.validate() {
            return Err(self.halt(Component::PriceSource, Some(Event::Tick(tick)), e));
        }
        if !self.instruments.contains(&tick.instrument) {
            let err = EngineError::UnknownInstrument(tick.instrument.clone());
            return Err(self.halt(Component::PriceSource, Some(Event::Tick(tick)), err));
        }
        if let Some(last) = self.last_tick_time {
            if tick.timestamp < last {
                let err = EngineError::OutOfOrder {
                    instrument: tick.instrument.clone(),
                    last,
                    got: tick.timestamp,
                };
                return Err(self.halt(Component::PriceSource, Some(Event::Tick(tick)), err));
            }
        }
        self.last_tick_time = Some(tick.timestamp);
        self.queue.push(Event::Tick(tick));
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<(), RunFailure> {
        match &event {
            Event::Tick(tick) => {
                self.quotes.update(tick);
                self.stats.ticks += 1;

                let signals = match self.strategy.on_tick(tick) {
                    Ok(signals) => signals,
                    Err(e) => return Err(self.halt(Component::Strategy, Some(event.clone()), e)),
                };
                for signal in signals {
                    self.stats.signals += 1;
                    self.notify(|o| o.on_signal(&signal));
                    self.queue.push(Event::Signal(signal));
                }

                if let Err(e) = self.portfolio.on_tick_mark(tick.timestamp, &self.quotes) {
                    return Err(self.halt(Component::Portfolio, Some(event.clone()), e));
                }
            }
            Event::Signal(signal) => match self.portfolio.on_signal(signal, &self.quotes) {
                Ok(SignalDecision::Order(order)) => {
                    self.stats.orders += 1;
                    self.notify(|o| o.on_order(&order));
                    self.queue.push(Event::Order(order));
                }
                Ok(SignalDecision::Suppressed(reason)) => {
                    self.stats.suppressed += 1;
                    self.notify(|o| o.on_suppressed(signal, reason));
                }
                Err(e) => return Err(self.halt(Component::Portfolio, Some(event.clone()), e)),
            },
            Event::Order(order) => match self.execution.on_order(order, &self.quotes) {
                Ok(fill) => self.queue.push(Event::Fill(fill)),
                Err(e) => return Err(self.halt(Component::Execution, Some(event.clone()), e)),
            },
            Event::Fill(fill) => match self.portfolio.on_fill(fill, &self.quotes) {
                Ok(point) => {
                    self.stats.fills += 1;
                    self.notify(|o| o.on_fill(fill, &point));
                }
                Err(e) => return Err(self.halt(Component::Portfolio, Some(event.clone()), e)),
            },
        }
        Ok(())
    }

    fn notify(&mut self, mut f: impl FnMut(&mut dyn EventObserver)) {
        f(&mut self.audit);
        for observer in &mut self.observers {
            f(observer.as_mut());
        }
    }

    fn last_equity(&self) -> Option<EquityPoint> {
        self.portfolio.equity_curve().last().copied()
    }

    fn halt(
        &mut self,
        component: Component,
        event: Option<Event>,
        err: impl Into<EngineError>,
    ) -> RunFailure {
        self.state = DriverState::Halted;
        self.halted_by = Some(component);
        let failure = RunFailure::new(component, event, self.last_equity(), err);
        tracing::error!(
            component = %component,
            error = %failure.source,
            last_equity = ?failure.last_equity.map(|p| p.equity),
            "backtest halted"
        );
        failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SourceError, VecSource};
    use crate::domain::Direction;
    use crate::engine::audit::AuditEntry;
    use crate::strategy::BollingerParams;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap()
    }

    fn ticks(instrument: &str, bids: &[f64]) -> Vec<Tick> {
        bids.iter()
            .enumerate()
            .map(|(i, &bid)| {
                Tick::new(instrument, base() + Duration::seconds(i as i64), bid, bid + 0.0002)
            })
            .collect()
    }

    fn config(window: usize, std_factor: f64) -> EngineConfig {
        EngineConfig::new(
            vec!["EURUSD".into()],
            BollingerParams { window, std_factor },
            100_000.0,
        )
    }

    fn backtest(cfg: &EngineConfig, ticks: Vec<Tick>) -> Backtest {
        Backtest::new(cfg, Box::new(VecSource::new(ticks))).unwrap()
    }

    #[test]
    fn empty_source_completes_with_empty_curve() {
        let mut bt = backtest(&config(3, 2.0), Vec::new());
        let result = bt.run().unwrap();
        assert_eq!(bt.state(), DriverState::Done);
        assert!(result.equity_curve.is_empty());
        assert!(result.equity_curve.is_sealed());
        assert_eq!(result.final_equity, 100_000.0);
    }

    #[test]
    fn each_step_dispatches_one_event() {
        let mut bt = backtest(&config(3, 1.0), ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5]));
        for _ in 0..3 {
            assert_eq!(bt.step().unwrap(), DriverState::Running);
            assert_eq!(bt.pending_events(), 0);
        }
        // tick 4 produces a signal, which waits in the queue
        bt.step().unwrap();
        assert_eq!(bt.pending_events(), 1);
        bt.step().unwrap(); // signal -> order
        bt.step().unwrap(); // order -> fill
        bt.step().unwrap(); // fill
        assert_eq!(bt.pending_events(), 0);
        assert_eq!(bt.portfolio().fills_processed(), 1);
        assert_eq!(bt.step().unwrap(), DriverState::Done);
        assert_eq!(bt.step().unwrap(), DriverState::Done);
    }

    #[test]
    fn buy_fills_at_ask_of_signal_tick() {
        let mut bt = backtest(&config(3, 1.0), ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5]));
        let result = bt.run().unwrap();
        assert_eq!(result.stats.fills, 1);
        let fill = result
            .audit_log
            .iter()
            .find_map(|r| match &r.entry {
                AuditEntry::Fill { price, direction, .. } => Some((*price, *direction)),
                _ => None,
            })
            .unwrap();
        assert_eq!(fill.1, Direction::Buy);
        assert!((fill.0 - 0.5002).abs() < 1e-12);
    }

    #[test]
    fn out_of_order_tick_halts_with_source_failure() {
        let mut t = ticks("EURUSD", &[1.0, 1.0]);
        t[1].timestamp = base() - Duration::seconds(5);
        let mut bt = backtest(&config(3, 2.0), t);
        let err = bt.run().unwrap_err();
        assert_eq!(err.component, Component::PriceSource);
        assert!(matches!(err.source, EngineError::OutOfOrder { .. }));
        assert_eq!(bt.state(), DriverState::Halted);
        assert_eq!(bt.step().unwrap(), DriverState::Halted);
        assert!(matches!(bt.run().unwrap_err().source, EngineError::Halted));
    }

    #[test]
    fn unconfigured_instrument_halts() {
        let mut bt = backtest(&config(3, 2.0), ticks("USDJPY", &[100.0]));
        let err = bt.run().unwrap_err();
        assert_eq!(err.component, Component::PriceSource);
        assert!(matches!(err.event, Some(Event::Tick(_))));
        assert!(err.last_equity.is_none());
    }

    /// Replays its ticks, then fails instead of ending.
    struct FailingSource {
        ticks: std::vec::IntoIter<Tick>,
    }

    impl PriceSource for FailingSource {
        fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
            match self.ticks.next() {
                Some(tick) => Ok(Some(tick)),
                None => Err(SourceError::Failed("feed disconnected".into())),
            }
        }
    }

    #[test]
    fn source_error_halts_without_event() {
        let source = FailingSource {
            ticks: ticks("EURUSD", &[1.0, 1.0, 1.0, 0.5]).into_iter(),
        };
        let mut bt = Backtest::new(&config(3, 1.0), Box::new(source)).unwrap();
        let err = bt.run().unwrap_err();

        assert_eq!(err.component, Component::PriceSource);
        assert!(err.event.is_none());
        assert!(matches!(err.source, EngineError::Source(SourceError::Failed(_))));
        assert_eq!(bt.state(), DriverState::Halted);

        // the fill on the fourth tick was sampled before the source failed
        let sample = err.last_equity.unwrap();
        let partial = bt.result();
        assert_eq!(partial.equity_curve.last(), Some(&sample));
        assert_eq!(partial.stats.fills, 1);
        assert!(!partial.equity_curve.is_sealed());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = config(0, 2.0);
        assert!(Backtest::new(&cfg, Box::new(VecSource::new(Vec::new()))).is_err());
    }
}
