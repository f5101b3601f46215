//! Prometheus counters for probes and passive reports

use crate::error::{Error, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Aliveness metrics registered on a crate-owned registry
#[derive(Clone)]
pub struct StatsMetrics {
    registry: Registry,
    alive_checks: IntCounterVec,
    operation_reports: IntCounterVec,
}

fn result_label(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

impl StatsMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let alive_checks = IntCounterVec::new(
            Opts::new(
                "multistorage_alive_checks_total",
                "Explicit storage alive checks by result",
            ),
            &["storage", "result"],
        )
        .map_err(|e| Error::Internal(format!("create alive checks counter: {e}")))?;
        let operation_reports = IntCounterVec::new(
            Opts::new(
                "multistorage_operation_reports_total",
                "Storage operation results reported to the aliveness cache",
            ),
            &["storage", "result"],
        )
        .map_err(|e| Error::Internal(format!("create operation reports counter: {e}")))?;

        registry
            .register(Box::new(alive_checks.clone()))
            .map_err(|e| Error::Internal(format!("register alive checks counter: {e}")))?;
        registry
            .register(Box::new(operation_reports.clone()))
            .map_err(|e| Error::Internal(format!("register operation reports counter: {e}")))?;

        Ok(Self {
            registry,
            alive_checks,
            operation_reports,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_alive_check(&self, storage: &str, alive: bool) {
        self.alive_checks
            .with_label_values(&[storage, result_label(alive)])
            .inc();
    }

    pub fn record_operation_report(&self, storage: &str, success: bool) {
        self.operation_reports
            .with_label_values(&[storage, result_label(success)])
            .inc();
    }

    pub fn alive_checks(&self, storage: &str, alive: bool) -> u64 {
        self.alive_checks
            .with_label_values(&[storage, result_label(alive)])
            .get()
    }

    pub fn operation_reports(&self, storage: &str, success: bool) -> u64 {
        self.operation_reports
            .with_label_values(&[storage, result_label(success)])
            .get()
    }

    /// Render every metric in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| Error::Internal(format!("encode metrics: {e}")))?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(format!("encode metrics: {e}")))
    }
}

impl std::fmt::Debug for StatsMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsMetrics").finish_non_exhaustive()
    }
}
