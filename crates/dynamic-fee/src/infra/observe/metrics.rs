/// Metrics for the dynamic fee client.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// Transitions of the swap authorization flow.
    #[metric(labels("from", "to"))]
    pub flow_transitions: prometheus::IntCounterVec,

    /// Fee events received from the hook, by whether they were new or
    /// duplicates.
    #[metric(labels("outcome"))]
    pub fee_events: prometheus::IntCounterVec,

    /// Fee tier previews, by resolved tier label.
    #[metric(labels("label"))]
    pub tier_resolutions: prometheus::IntCounterVec,

    /// Fees the hook applied to observed swaps, in hundredths of a basis
    /// point.
    #[metric(buckets(100, 300, 500, 1000, 3000, 10000, 30000))]
    pub fees_applied: prometheus::Histogram,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("dynamic_fee".to_owned()), None);
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}
