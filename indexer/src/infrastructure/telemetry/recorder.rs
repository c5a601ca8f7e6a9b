use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Duration;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }

    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Sink for the indexer's metrics
pub trait MetricsRecorder: Send + Sync {
    /// One observation per decorated call
    fn observe_call(
        &self,
        operation: &'static str,
        implementation: &'static str,
        outcome: Outcome,
        elapsed: Duration,
    );

    /// Business counter for a successful `save_delegations`
    fn record_saved(&self, rows: u64, tez: Decimal);

    /// A poller tick was skipped because a cycle was still running
    fn record_dropped_tick(&self);

    fn set_highest_level(&self, level: u64);

    /// Text exposition served on `/metrics`
    fn render(&self) -> String;
}

pub struct NoopRecorder;

impl MetricsRecorder for NoopRecorder {
    fn observe_call(&self, _: &'static str, _: &'static str, _: Outcome, _: Duration) {}

    fn record_saved(&self, _: u64, _: Decimal) {}

    fn record_dropped_tick(&self) {}

    fn set_highest_level(&self, _: u64) {}

    fn render(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallKey {
    pub operation: &'static str,
    pub implementation: &'static str,
    pub outcome: Outcome,
}

#[derive(Default)]
struct MemoryState {
    calls: BTreeMap<CallKey, u64>,
    saved_rows: u64,
    saved_tez: Decimal,
    dropped_ticks: u64,
    highest_level: u64,
}

/// In-process counters, readable from tests and `/metrics`
#[derive(Default)]
pub struct MemoryRecorder {
    state: Mutex<MemoryState>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self, operation: &str, outcome: Outcome) -> u64 {
        self.lock()
            .calls
            .iter()
            .filter(|(key, _)| key.operation == operation && key.outcome == outcome)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn saved_rows(&self) -> u64 {
        self.lock().saved_rows
    }

    pub fn saved_tez(&self) -> Decimal {
        self.lock().saved_tez
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.lock().dropped_ticks
    }

    pub fn highest_level(&self) -> u64 {
        self.lock().highest_level
    }
}

impl MetricsRecorder for MemoryRecorder {
    fn observe_call(
        &self,
        operation: &'static str,
        implementation: &'static str,
        outcome: Outcome,
        _elapsed: Duration,
    ) {
        let key = CallKey {
            operation,
            implementation,
            outcome,
        };
        *self.lock().calls.entry(key).or_default() += 1;
    }

    fn record_saved(&self, rows: u64, tez: Decimal) {
        let mut state = self.lock();
        state.saved_rows += rows;
        state.saved_tez += tez;
    }

    fn record_dropped_tick(&self) {
        self.lock().dropped_ticks += 1;
    }

    fn set_highest_level(&self, level: u64) {
        self.lock().highest_level = level;
    }

    fn render(&self) -> String {
        let state = self.lock();
        let mut out = String::new();
        for (key, count) in &state.calls {
            let _ = writeln!(
                out,
                "tezos_indexer_calls_total{{operation=\"{}\",impl=\"{}\",outcome=\"{}\"}} {}",
                key.operation,
                key.implementation,
                key.outcome.as_str(),
                count
            );
        }
        let _ = writeln!(out, "tezos_indexer_saved_rows_total {}", state.saved_rows);
        let _ = writeln!(out, "tezos_indexer_saved_tez_total {}", state.saved_tez);
        let _ = writeln!(out, "tezos_indexer_dropped_ticks_total {}", state.dropped_ticks);
        let _ = writeln!(out, "tezos_indexer_highest_level {}", state.highest_level);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_recorder_accumulates() {
        let recorder = MemoryRecorder::new();
        recorder.observe_call("fetch_page", "mock", Outcome::Success, Duration::ZERO);
        recorder.observe_call("fetch_page", "api", Outcome::Success, Duration::ZERO);
        recorder.observe_call("fetch_page", "mock", Outcome::Failure, Duration::ZERO);
        recorder.record_saved(2, Decimal::new(15, 1));
        recorder.record_saved(1, Decimal::TWO);

        assert_eq!(recorder.calls("fetch_page", Outcome::Success), 2);
        assert_eq!(recorder.calls("fetch_page", Outcome::Failure), 1);
        assert_eq!(recorder.saved_rows(), 3);
        assert_eq!(recorder.saved_tez(), Decimal::new(35, 1));

        let text = recorder.render();
        assert!(text.contains("tezos_indexer_saved_rows_total 3"));
        assert!(text.contains(
            "tezos_indexer_calls_total{operation=\"fetch_page\",impl=\"mock\",outcome=\"failure\"} 1"
        ));
    }
}
