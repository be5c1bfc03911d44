//! Prometheus metrics for the health assistant service.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so unit tests
//! never need a registry.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// All collectors, registered in one registry.
struct Metrics {
    registry: Registry,
    chat_requests_total: IntCounterVec,
    chat_request_duration_seconds: HistogramVec,
    biometric_lookup_duration_seconds: HistogramVec,
    genai_provider_latency_seconds: HistogramVec,
    genai_provider_errors_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let chat_requests_total = IntCounterVec::new(
            Opts::new("chat_requests_total", "Total number of chat requests"),
            &["outcome"], // ok, bad_request, error
        )?;

        let chat_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "chat_request_duration_seconds",
                "Chat request duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["outcome"],
        )?;

        let biometric_lookup_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "biometric_lookup_duration_seconds",
                "Latest biometric document lookup duration in seconds",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["result"], // found, empty, error
        )?;

        let genai_provider_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "genai_provider_latency_seconds",
                "AI provider API latency in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["provider", "model"],
        )?;

        let genai_provider_errors_total = IntCounterVec::new(
            Opts::new("genai_provider_errors_total", "Total AI provider errors"),
            &["provider", "error_type"],
        )?;

        registry.register(Box::new(chat_requests_total.clone()))?;
        registry.register(Box::new(chat_request_duration_seconds.clone()))?;
        registry.register(Box::new(biometric_lookup_duration_seconds.clone()))?;
        registry.register(Box::new(genai_provider_latency_seconds.clone()))?;
        registry.register(Box::new(genai_provider_errors_total.clone()))?;

        Ok(Self {
            registry,
            chat_requests_total,
            chat_request_duration_seconds,
            biometric_lookup_duration_seconds,
            genai_provider_latency_seconds,
            genai_provider_errors_total,
        })
    }
}

/// Initialize all metrics. Later calls are ignored.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }
    // Concurrent callers may both build a set; only one is kept.
    let _ = METRICS.set(Metrics::new()?);
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed chat request.
pub fn record_chat_request(outcome: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.chat_requests_total.with_label_values(&[outcome]).inc();
        m.chat_request_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }
}

/// Record a biometric lookup.
pub fn record_biometric_lookup(result: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.biometric_lookup_duration_seconds
            .with_label_values(&[result])
            .observe(duration_secs);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_latency_seconds
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_errors_total
            .with_label_values(&[provider, error_type])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposition_includes_recorded_chat_requests() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        record_chat_request("ok", 0.2);
        record_biometric_lookup("empty", 0.003);

        let text = get_metrics();
        assert!(text.contains("chat_requests_total{outcome=\"ok\"}"));
        assert!(text.contains("biometric_lookup_duration_seconds_bucket"));
    }
}
