use mdlog_core::ErrorKind;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Append metrics. When disabled nothing is registered and every recording
/// method returns immediately.
pub struct MetricsCollector {
    enabled: bool,
    registry: Option<Registry>,
    pub entries_appended: Option<IntCounter>,
    pub append_failures: Option<IntCounterVec>,
    pub append_duration: Option<Histogram>,
}

impl MetricsCollector {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let registry = Registry::new();

        let entries_appended = IntCounter::with_opts(Opts::new(
            "mdlog_entries_appended_total",
            "Log entries appended to error_log.md",
        ))?;

        let append_failures = IntCounterVec::new(
            Opts::new("mdlog_append_failures_total", "Failed POST /log requests"),
            &["kind"],
        )?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new("mdlog_append_duration_seconds", "Time spent appending one entry")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;

        registry.register(Box::new(entries_appended.clone()))?;
        registry.register(Box::new(append_failures.clone()))?;
        registry.register(Box::new(append_duration.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            entries_appended: Some(entries_appended),
            append_failures: Some(append_failures),
            append_duration: Some(append_duration),
        })
    }

    /// No-op collector.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: None,
            entries_appended: None,
            append_failures: None,
            append_duration: None,
        }
    }

    #[inline]
    pub fn record_append(&self, duration_secs: f64) {
        if !self.enabled {
            return;
        }
        if let Some(ref counter) = self.entries_appended {
            counter.inc();
        }
        if let Some(ref hist) = self.append_duration {
            hist.observe(duration_secs);
        }
    }

    #[inline]
    pub fn record_failure(&self, kind: ErrorKind) {
        if let Some(ref counter) = self.append_failures {
            counter.with_label_values(&[kind.as_str()]).inc();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        let Some(ref registry) = self.registry else {
            return String::new();
        };
        let encoder = TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
