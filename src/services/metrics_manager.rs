use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Process-wide counters and histograms, rendered by `GET /metrics`.
#[derive(Clone)]
pub struct MetricsManager {
    registry: Registry,
    http_requests: CounterVec,
    http_duration: HistogramVec,
    upstream_requests: CounterVec,
    upstream_duration: HistogramVec,
    session_fallbacks: CounterVec,
}

impl std::fmt::Debug for MetricsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsManager").finish_non_exhaustive()
    }
}

impl MetricsManager {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("relay".to_string()), None)?;

        let http_requests = CounterVec::new(
            Opts::new("http_requests_total", "Inbound HTTP requests"),
            &["method", "route", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Inbound HTTP request duration in seconds",
            ),
            &["method", "route"],
        )?;
        let upstream_requests = CounterVec::new(
            Opts::new("upstream_requests_total", "Outbound calls to third-party services"),
            &["upstream", "outcome"],
        )?;
        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "upstream_duration_seconds",
                "Outbound call duration in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
            &["upstream"],
        )?;
        let session_fallbacks = CounterVec::new(
            Opts::new(
                "session_fallback_total",
                "Conversation creations retried with the Spanish language fallback",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(upstream_requests.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(session_fallbacks.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            upstream_requests,
            upstream_duration,
            session_fallbacks,
        })
    }

    pub fn record_http(&self, method: &str, route: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        self.http_requests
            .with_label_values(&[method, route, status.as_str()])
            .inc();
        self.http_duration
            .with_label_values(&[method, route])
            .observe(seconds);
    }

    pub fn record_upstream(&self, upstream: &str, outcome: &str, seconds: f64) {
        self.upstream_requests
            .with_label_values(&[upstream, outcome])
            .inc();
        self.upstream_duration
            .with_label_values(&[upstream])
            .observe(seconds);
    }

    pub fn record_fallback(&self, outcome: &str) {
        self.session_fallbacks.with_label_values(&[outcome]).inc();
    }

    /// Count recorded for one `upstream_requests_total` series.
    pub fn upstream_count(&self, upstream: &str, outcome: &str) -> u64 {
        self.upstream_requests
            .with_label_values(&[upstream, outcome])
            .get() as u64
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
