use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_attempts_total: IntCounterVec,
    pub dispatch_latency_seconds: HistogramVec,
    pub lifecycle_transitions_total: IntCounterVec,
    pub couriers_busy: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_attempts_total = IntCounterVec::new(
            Opts::new(
                "dispatch_attempts_total",
                "Dispatch attempts by mode and outcome",
            ),
            &["mode", "outcome"],
        )
        .expect("valid dispatch_attempts_total metric");

        let dispatch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of dispatch requests in seconds",
            ),
            &["mode"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let lifecycle_transitions_total = IntCounterVec::new(
            Opts::new(
                "lifecycle_transitions_total",
                "Order lifecycle transitions by target state",
            ),
            &["transition"],
        )
        .expect("valid lifecycle_transitions_total metric");

        let couriers_busy = IntGauge::new("couriers_busy", "Couriers currently holding an order")
            .expect("valid couriers_busy metric");

        registry
            .register(Box::new(dispatch_attempts_total.clone()))
            .expect("register dispatch_attempts_total");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(lifecycle_transitions_total.clone()))
            .expect("register lifecycle_transitions_total");
        registry
            .register(Box::new(couriers_busy.clone()))
            .expect("register couriers_busy");

        Self {
            registry,
            dispatch_attempts_total,
            dispatch_latency_seconds,
            lifecycle_transitions_total,
            couriers_busy,
        }
    }

    pub fn record_dispatch(&self, mode: &str, outcome: &str, elapsed_seconds: f64) {
        self.dispatch_attempts_total
            .with_label_values(&[mode, outcome])
            .inc();
        self.dispatch_latency_seconds
            .with_label_values(&[mode])
            .observe(elapsed_seconds);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
