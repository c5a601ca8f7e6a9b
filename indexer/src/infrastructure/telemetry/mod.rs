//! Call latency and business counters around the upstream and store seams

pub mod instrumented;
pub mod prom;
pub mod recorder;

pub use instrumented::{InstrumentedSource, InstrumentedStore};
pub use prom::PrometheusRecorder;
pub use recorder::{CallKey, MemoryRecorder, MetricsRecorder, NoopRecorder, Outcome};

use std::sync::Arc;

use crate::config::{MetricsConfig, MetricsImpl};

/// Builds the recorder selected by `metrics.impl`
pub fn build_recorder(
    config: &MetricsConfig,
) -> Result<Arc<dyn MetricsRecorder>, prometheus::Error> {
    Ok(match config.implementation {
        MetricsImpl::Prometheus => Arc::new(PrometheusRecorder::new()?),
        MetricsImpl::Memory => Arc::new(MemoryRecorder::new()),
        MetricsImpl::Noop => Arc::new(NoopRecorder),
    })
}
