use {
    prometheus::Encoder,
    std::{collections::HashMap, net::SocketAddr, sync::OnceLock},
    tokio::task::{self, JoinHandle},
};

/// Global metrics registry used by all components.
static REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Configure global metrics registry.
///
/// This function allows specifying common prefix that will be added
/// to all metric names, as well as common labels.
///
/// This function should be called at most once, before any call to
/// [`get_registry`], ideally in the very beginning of the `main` function.
/// Calls after the registry has been initialized are ignored with a warning.
pub fn setup_registry(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    let registry = match prometheus::Registry::new_custom(prefix, labels) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(?err, "invalid metrics registry configuration");
            return;
        }
    };
    let storage_registry = prometheus_metric_storage::StorageRegistry::new(registry);
    if REGISTRY.set(storage_registry).is_err() {
        tracing::warn!("metrics registry was already initialized");
    }
}

/// Like [`setup_registry`], but can be called multiple times in a row.
/// Later calls are silently ignored.
///
/// Useful for tests.
pub fn setup_registry_reentrant(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    if let Ok(registry) = prometheus::Registry::new_custom(prefix, labels) {
        let storage_registry = prometheus_metric_storage::StorageRegistry::new(registry);
        REGISTRY.set(storage_registry).ok();
    }
}

/// Get the global instance of the metrics registry.
pub fn get_registry() -> &'static prometheus::Registry {
    get_storage_registry().registry()
}

/// Get the global instance of the metric storage registry.
///
/// If the registry was not configured with [`setup_registry`] it gets
/// initialized with default values. That keeps unit tests from having to set
/// it up manually.
pub fn get_storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    REGISTRY.get_or_init(prometheus_metric_storage::StorageRegistry::default)
}

/// Encodes all gathered metrics in the prometheus text format.
pub fn encode(registry: &prometheus::Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(?err, "failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Serves the `/metrics` route on the given address in a background task.
pub fn serve_metrics(address: SocketAddr) -> JoinHandle<()> {
    async fn metrics_handler() -> String {
        encode(get_registry())
    }

    let app = axum::Router::new().route("/metrics", axum::routing::get(metrics_handler));
    tracing::info!(%address, "serving metrics");
    task::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(address).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(?err, %address, "failed to bind metrics listener");
                return;
            }
        };
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(?err, "metrics server stopped");
        }
    })
}
