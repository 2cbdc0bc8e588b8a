//! Metric names and recording helpers for the gallery sync job

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Completed sync runs, attribute `outcome` = `complete` | `failed`
pub const GALLERY_SYNC_RUNS: &str = "gallery.sync.runs";
/// Individual file operations, attributes `action` and `outcome`
pub const GALLERY_SYNC_OPERATIONS: &str = "gallery.sync.operations";
/// Wall-clock duration of a run in seconds
pub const GALLERY_SYNC_DURATION: &str = "gallery.sync.duration";

/// Instruments used by the sync job
///
/// Backed by the global meter provider, so recording is a no-op when no
/// exporter is configured.
#[derive(Clone)]
pub struct SyncMetrics {
    runs: Counter<u64>,
    operations: Counter<u64>,
    duration: Histogram<f64>,
}

impl SyncMetrics {
    /// Create instruments on the global `atelier` meter
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("atelier"))
    }

    /// Create instruments on the given meter
    pub fn new(meter: &Meter) -> Self {
        Self {
            runs: meter
                .u64_counter(GALLERY_SYNC_RUNS)
                .with_description("Gallery sync runs by outcome")
                .build(),
            operations: meter
                .u64_counter(GALLERY_SYNC_OPERATIONS)
                .with_description("Gallery file operations by action and outcome")
                .build(),
            duration: meter
                .f64_histogram(GALLERY_SYNC_DURATION)
                .with_unit("s")
                .with_description("Gallery sync run duration")
                .build(),
        }
    }

    /// Record one delete or download attempt
    pub fn record_operation(&self, action: &'static str, success: bool) {
        self.operations.add(
            1,
            &[
                KeyValue::new("action", action),
                KeyValue::new("outcome", if success { "ok" } else { "error" }),
            ],
        );
    }

    /// Record the end of a run that started at `start`
    pub fn record_run(&self, start: Instant, success: bool) {
        let attributes = [KeyValue::new("outcome", if success { "complete" } else { "failed" })];
        self.runs.add(1, &attributes);
        self.duration.record(start.elapsed().as_secs_f64(), &attributes);
    }
}
