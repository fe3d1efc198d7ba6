//! Observability for the check engine
//!
//! Provides:
//! - Prometheus counters (evaluated checks by status, override decode failures,
//!   unknown check lookups)
//! - Structured logging with tracing

use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::models::{ApplicationId, Status};

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    checks_evaluated: IntCounterVec,
    override_decode_failures: IntCounter,
    unknown_check_lookups: IntCounter,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            checks_evaluated: register_int_counter_vec!(
                "check_engine_checks_evaluated_total",
                "Number of check evaluations by resulting status",
                &["status"]
            )
            .expect("Failed to register checks_evaluated_total"),

            override_decode_failures: register_int_counter!(
                "check_engine_override_decode_failures_total",
                "Number of override payloads that could not be decoded"
            )
            .expect("Failed to register override_decode_failures_total"),

            unknown_check_lookups: register_int_counter!(
                "check_engine_unknown_check_lookups_total",
                "Number of lookups for check ids missing from the registry"
            )
            .expect("Failed to register unknown_check_lookups_total"),
        }
    }
}

/// Handle to the engine's Prometheus metrics
///
/// Clones share the same underlying counters.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn inc_checks_evaluated(&self, status: Status) {
        self.inner()
            .checks_evaluated
            .with_label_values(&[status.as_str()])
            .inc();
    }

    pub fn checks_evaluated(&self, status: Status) -> u64 {
        self.inner()
            .checks_evaluated
            .with_label_values(&[status.as_str()])
            .get()
    }

    pub fn inc_override_decode_failures(&self) {
        self.inner().override_decode_failures.inc();
    }

    pub fn override_decode_failures(&self) -> u64 {
        self.inner().override_decode_failures.get()
    }

    pub fn inc_unknown_check_lookups(&self) {
        self.inner().unknown_check_lookups.inc();
    }

    pub fn unknown_check_lookups(&self) -> u64 {
        self.inner().unknown_check_lookups.get()
    }
}

/// Structured logger for engine events
///
/// Every event carries the engine component that produced it.
#[derive(Debug, Clone, Copy)]
pub struct StructuredLogger {
    component: &'static str,
}

impl StructuredLogger {
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Log the outcome of a check evaluation
    pub fn log_check_evaluated(&self, check_id: &str, status: Status, message: &str) {
        match status {
            Status::Ok => {
                debug!(
                    event = "check_evaluated",
                    component = self.component,
                    check = %check_id,
                    status = %status,
                    "Check is not firing"
                );
            }
            Status::Unknown => {
                warn!(
                    event = "check_unknown",
                    component = self.component,
                    check = %check_id,
                    status = %status,
                    message = %message,
                    "Check could not be evaluated"
                );
            }
            _ => {
                info!(
                    event = "check_fired",
                    component = self.component,
                    check = %check_id,
                    status = %status,
                    message = %message,
                    "Check fired"
                );
            }
        }
    }

    /// Log an override payload that failed to decode
    pub fn log_decode_failure(
        &self,
        check_id: &str,
        selector: &str,
        error: &dyn std::error::Error,
    ) {
        warn!(
            event = "override_decode_failed",
            component = self.component,
            check = %check_id,
            selector = %selector,
            error = %error,
            "failed to unmarshal check config"
        );
    }

    /// Log a lookup for a check id that is not registered
    pub fn log_unknown_check(&self, check_id: &str) {
        warn!(
            event = "unknown_check",
            component = self.component,
            check = %check_id,
            "unknown check"
        );
    }

    /// Log which override tier supplied a check's configuration
    pub fn log_resolution(&self, app: &ApplicationId, check_id: &str, tier: &str) {
        debug!(
            event = "override_resolved",
            component = self.component,
            app = %app,
            check = %check_id,
            tier = %tier,
            "Resolved check config"
        );
    }
}
