use std::time::Duration;

use prometheus::{
    register_counter_with_registry, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Counter, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use crate::infrastructure::telemetry::recorder::{MetricsRecorder, Outcome};

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Prometheus metrics on a registry owned by the process
#[derive(Clone, Debug)]
pub struct PrometheusRecorder {
    registry: Registry,
    /// Latency of decorated upstream and store calls
    call_duration: HistogramVec,
    calls: IntCounterVec,
    saved_rows: IntCounter,
    saved_tez: Counter,
    dropped_ticks: IntCounter,
    highest_level: IntGauge,
}

impl PrometheusRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            call_duration: register_histogram_vec_with_registry!(
                "tezos_indexer_call_duration_seconds",
                "Latency of upstream and store calls",
                &["operation", "impl", "outcome"],
                LATENCY_BUCKETS.to_vec(),
                registry
            )?,
            calls: register_int_counter_vec_with_registry!(
                "tezos_indexer_calls_total",
                "Number of upstream and store calls",
                &["operation", "impl", "outcome"],
                registry
            )?,
            saved_rows: register_int_counter_with_registry!(
                "tezos_indexer_saved_rows_total",
                "Delegations submitted in successful store writes",
                registry
            )?,
            saved_tez: register_counter_with_registry!(
                "tezos_indexer_saved_tez_total",
                "Sum of amounts in successful store writes, in tez",
                registry
            )?,
            dropped_ticks: register_int_counter_with_registry!(
                "tezos_indexer_dropped_ticks_total",
                "Poller ticks skipped because a cycle was in flight",
                registry
            )?,
            highest_level: register_int_gauge_with_registry!(
                "tezos_indexer_highest_level",
                "Highest block level seen in the store",
                registry
            )?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsRecorder for PrometheusRecorder {
    fn observe_call(
        &self,
        operation: &'static str,
        implementation: &'static str,
        outcome: Outcome,
        elapsed: Duration,
    ) {
        let labels = [operation, implementation, outcome.as_str()];
        self.call_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
        self.calls.with_label_values(&labels).inc();
    }

    fn record_saved(&self, rows: u64, tez: Decimal) {
        self.saved_rows.inc_by(rows);
        if let Some(tez) = tez.to_f64() {
            if tez >= 0.0 {
                self.saved_tez.inc_by(tez);
            }
        }
    }

    fn record_dropped_tick(&self) {
        self.dropped_ticks.inc();
    }

    fn set_highest_level(&self, level: u64) {
        self.highest_level
            .set(i64::try_from(level).unwrap_or(i64::MAX));
    }

    fn render(&self) -> String {
        let metric_families = self.registry.gather();
        match TextEncoder.encode_to_string(&metric_families) {
            Ok(metrics) => metrics,
            Err(error) => {
                warn!(%error, "unable to encode metrics");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_metrics() {
        let recorder = PrometheusRecorder::new().unwrap();
        recorder.observe_call(
            "save_delegations",
            "psql",
            Outcome::Success,
            Duration::from_millis(3),
        );
        recorder.record_saved(2, Decimal::new(15, 1));
        recorder.set_highest_level(11);

        let text = recorder.render();
        assert!(text.contains("tezos_indexer_saved_rows_total 2"));
        assert!(text.contains("tezos_indexer_saved_tez_total 1.5"));
        assert!(text.contains("tezos_indexer_highest_level 11"));
        let calls = text
            .lines()
            .find(|line| line.starts_with("tezos_indexer_calls_total{"))
            .unwrap();
        assert!(calls.contains("operation=\"save_delegations\""));
        assert!(calls.contains("impl=\"psql\""));
        assert!(calls.ends_with(" 1"));
    }

    #[test]
    fn separate_registries_do_not_collide() {
        PrometheusRecorder::new().unwrap();
        PrometheusRecorder::new().unwrap();
    }
}
