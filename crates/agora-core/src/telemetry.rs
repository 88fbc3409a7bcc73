//! Telemetry sink consumed by the tick orchestrator.
//!
//! The core never writes files or talks to a network; it hands trade
//! records, pairing events and tick summaries to a [`TelemetrySink`]. The
//! engine binary supplies a JSON-lines implementation.

use agora_types::{PairingEvent, TradeRecord};

use crate::tick::TickSummary;

/// Receives everything the simulation reports.
///
/// Every method defaults to a no-op so sinks implement only what they need.
pub trait TelemetrySink {
    /// Called once per executed trade.
    fn record_trade(&mut self, _record: &TradeRecord) {}

    /// Called once per pairing or unpairing.
    fn record_pairing(&mut self, _event: &PairingEvent) {}

    /// Called after each tick completes.
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl TelemetrySink for NoOpSink {}

/// A sink that keeps everything in memory, for tests and analysis.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Trades in execution order.
    pub trades: Vec<TradeRecord>,
    /// Pairing events in emission order.
    pub pairings: Vec<PairingEvent>,
    /// Tick summaries in tick order.
    pub summaries: Vec<TickSummary>,
}

impl MemorySink {
    /// An empty sink.
    pub const fn new() -> Self {
        Self {
            trades: Vec::new(),
            pairings: Vec::new(),
            summaries: Vec::new(),
        }
    }
}

impl TelemetrySink for MemorySink {
    fn record_trade(&mut self, record: &TradeRecord) {
        self.trades.push(record.clone());
    }

    fn record_pairing(&mut self, event: &PairingEvent) {
        self.pairings.push(*event);
    }

    fn on_tick(&mut self, summary: &TickSummary) {
        self.summaries.push(summary.clone());
    }
}
