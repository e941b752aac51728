use prometheus::{GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Session metrics
    pub auth_requests: IntCounterVec,
    pub auth_failures: IntCounterVec,
    pub session_expiry_unix: IntGaugeVec,

    // Data endpoint metrics
    pub fetch_requests: IntCounterVec,
    pub fetch_failures: IntCounterVec,
    pub fetch_duration: HistogramVec,

    // Readings
    pub reading_kilowatts: GaugeVec,

    // Polling loop
    pub ticks: IntCounterVec,
    pub outage_warnings: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("loopagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Session
            auth_requests: IntCounterVec::new(Opts::new("auth_requests_total", "Identity exchanges by flow"),&["client", "flow"],).unwrap(),
            auth_failures: IntCounterVec::new(Opts::new("auth_failures_total", "Failed identity exchanges by reason"),&["client", "flow", "reason"],).unwrap(),
            session_expiry_unix: IntGaugeVec::new(Opts::new("session_expiry_unix_seconds", "Session expiry timestamp (safety margin applied)"),&["client"],).unwrap(),

            // Data endpoints
            fetch_requests: IntCounterVec::new(Opts::new("fetch_requests_total", "Data endpoint requests"),&["client", "endpoint"],).unwrap(),
            fetch_failures: IntCounterVec::new(Opts::new("fetch_failures_total", "Data endpoint failures by reason"),&["client", "endpoint", "reason"],).unwrap(),
            fetch_duration: HistogramVec::new(HistogramOpts::new("fetch_duration_seconds", "Data endpoint request duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),&["endpoint"],).unwrap(),

            reading_kilowatts: GaugeVec::new(Opts::new("reading_kilowatts", "Last known reading, absent while unknown"),&["client", "sensor"],).unwrap(),

            ticks: IntCounterVec::new(Opts::new("ticks_total", "Polling ticks by outcome"),&["client", "outcome"],).unwrap(),
            outage_warnings: IntCounterVec::new(Opts::new("outage_warnings_total", "Warnings emitted at the onset of an outage"),&["client"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.auth_requests.clone())).unwrap();
        reg.register(Box::new(metrics.auth_failures.clone())).unwrap();
        reg.register(Box::new(metrics.session_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.reading_kilowatts.clone())).unwrap();
        reg.register(Box::new(metrics.ticks.clone())).unwrap();
        reg.register(Box::new(metrics.outage_warnings.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
