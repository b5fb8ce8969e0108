// Metrics hooks for the `matcher` crate.
//
// Callers install a global `SearchMetrics` implementation via [`set_search_metrics`];
// every `SearchService::search` call then reports its latency and result count, or the
// kind of failure. This keeps instrumentation decoupled from any specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for search operations.
pub trait SearchMetrics: Send + Sync {
    /// `variant_count` is the number of expanded query variants that were encoded, `latency`
    /// the wall-clock time of the whole search and `hit_count` the number of results returned.
    fn record_search(&self, variant_count: usize, latency: Duration, hit_count: usize);

    /// `kind` is a short stable label such as `"encoding"` or `"invalid_top_k"`.
    fn record_failure(&self, kind: &str);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn SearchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn SearchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn SearchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global search metrics recorder.
///
/// Usually called once during service startup.
pub fn set_search_metrics(recorder: Option<Arc<dyn SearchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
