use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Exchange metrics
    pub exchange_attempts: IntCounterVec,
    pub exchange_cycle_duration: HistogramVec,

    // Store metrics
    pub store_writes: IntCounterVec,

    // Publication metrics
    pub publish_requests: IntCounterVec,

    // Runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenrelay".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            exchange_attempts: IntCounterVec::new(Opts::new("exchange_attempts_total", "Token exchange attempts by outcome"), &["outcome"]).unwrap(),
            exchange_cycle_duration: HistogramVec::new(HistogramOpts::new("exchange_cycle_duration_seconds", "Full refresh cycle duration, retries included").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0, 120.0]), &["outcome"]).unwrap(),

            store_writes: IntCounterVec::new(Opts::new("store_writes_total", "Token record writes by outcome"), &["outcome"]).unwrap(),

            publish_requests: IntCounterVec::new(Opts::new("publish_requests_total", "Publication endpoint requests by status"), &["status"]).unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.exchange_attempts.clone())).unwrap();
        reg.register(Box::new(metrics.exchange_cycle_duration.clone())).unwrap();
        reg.register(Box::new(metrics.store_writes.clone())).unwrap();
        reg.register(Box::new(metrics.publish_requests.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
