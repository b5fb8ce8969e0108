//! Prometheus wiring for the search pipeline.

use matcher::SearchMetrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;

/// Forwards [`SearchMetrics`] events to the global `metrics` recorder.
#[derive(Debug, Default)]
pub struct PrometheusSearchMetrics;

impl SearchMetrics for PrometheusSearchMetrics {
    fn record_search(&self, variant_count: usize, latency: Duration, hit_count: usize) {
        metrics::counter!("nco_search_requests_total").increment(1);
        metrics::histogram!("nco_search_latency_seconds").record(latency.as_secs_f64());
        metrics::histogram!("nco_search_query_variants").record(variant_count as f64);
        metrics::histogram!("nco_search_hits").record(hit_count as f64);
    }

    fn record_failure(&self, kind: &str) {
        metrics::counter!("nco_search_failures_total", "kind" => kind.to_string()).increment(1);
    }
}

/// Installs the Prometheus recorder and routes search events into it.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    matcher::set_search_metrics(Some(Arc::new(PrometheusSearchMetrics)));
    Ok(handle)
}
