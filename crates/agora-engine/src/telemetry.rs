//! JSON-lines telemetry sink.
//!
//! Every trade, pairing event and tick summary becomes one JSON object on
//! its own line, tagged with a `kind` field.

use std::io::Write;

use agora_core::{TelemetrySink, TickSummary};
use agora_types::{PairingEvent, TradeRecord};
use serde::Serialize;
use tracing::warn;

/// One line of output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Trade(&'a TradeRecord),
    Pairing(&'a PairingEvent),
    Tick(&'a TickSummary),
}

/// Writes telemetry as JSON lines to any writer.
///
/// The sink interface cannot fail, so the first write error is kept and
/// later lines are dropped; [`JsonLinesSink::finish`] reports it.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    error: Option<std::io::Error>,
    lines: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
            lines: 0,
        }
    }

    fn write_line(&mut self, line: &Line<'_>) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, line)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        match result {
            Ok(()) => self.lines = self.lines.saturating_add(1),
            Err(err) => {
                warn!(%err, "Telemetry write failed; further lines dropped");
                self.error = Some(err);
            }
        }
    }

    /// Flush and return the writer and the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns the first write error, or the flush error.
    pub fn finish(mut self) -> Result<(W, u64), std::io::Error> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok((self.writer, self.lines))
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn record_trade(&mut self, record: &TradeRecord) {
        self.write_line(&Line::Trade(record));
    }

    fn record_pairing(&mut self, event: &PairingEvent) {
        self.write_line(&Line::Pairing(event));
    }

    fn on_tick(&mut self, summary: &TickSummary) {
        self.write_line(&Line::Tick(summary));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use agora_types::{AgentId, PairingEventKind, PairingReason};

    use super::*;

    #[test]
    fn writes_one_tagged_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record_pairing(&PairingEvent::new(
            3,
            AgentId::new(2),
            AgentId::new(1),
            PairingEventKind::Paired(PairingReason::MutualConsent),
        ));
        sink.record_pairing(&PairingEvent::new(
            4,
            AgentId::new(1),
            AgentId::new(2),
            PairingEventKind::Paired(PairingReason::GreedyFallback),
        ));
        let (bytes, lines) = sink.finish().unwrap();
        assert_eq!(lines, 2);
        let text = String::from_utf8(bytes).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["kind"], "pairing");
        assert_eq!(rows[0]["tick"], 3);
        assert_eq!(rows[0]["first"], 1);
        assert_eq!(rows[0]["second"], 2);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_error_is_reported() {
        let mut sink = JsonLinesSink::new(Broken);
        sink.record_pairing(&PairingEvent::new(
            1,
            AgentId::new(0),
            AgentId::new(1),
            PairingEventKind::Paired(PairingReason::MutualConsent),
        ));
        assert!(sink.finish().is_err());
    }
}
