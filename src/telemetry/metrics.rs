//! Prometheus metrics
//!
//! Recorded through the `metrics` facade; a no-op until an exporter is
//! installed.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One full tick, including observer delivery
    Tick,
    /// Time to first streamed chat fragment
    ChatFirstFragment,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks executed
    Ticks,
    /// Observers that panicked during delivery
    ObserverPanics,
}

/// Final outcome of one chat request, the `outcome` label of
/// `chat_requests_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    Completed,
    /// Replaced by the apology message
    Failed,
}

impl ChatOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatOutcome::Completed => "completed",
            ChatOutcome::Failed => "failed",
        }
    }
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Registered snapshot observers
    Subscribers,
}

const CHAT_REQUESTS: &str = "chat_requests_total";

fn latency_name(metric: LatencyMetric) -> &'static str {
    match metric {
        LatencyMetric::Tick => "ticker_tick_duration_ms",
        LatencyMetric::ChatFirstFragment => "chat_first_fragment_latency_ms",
    }
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::Ticks => "ticker_ticks_total",
        CounterMetric::ObserverPanics => "ticker_observer_panics_total",
    }
}

fn gauge_name(metric: GaugeMetric) -> &'static str {
    match metric {
        GaugeMetric::Subscribers => "ticker_subscribers",
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(latency_name(metric)).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(counter_name(metric)).increment(1);
}

/// Count one finished chat request under its outcome label
pub fn record_chat_outcome(outcome: ChatOutcome) {
    metrics::counter!(CHAT_REQUESTS, "outcome" => outcome.as_str()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(gauge_name(metric)).set(value);
}

/// Install the Prometheus recorder with an HTTP scrape listener
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus metrics listening");
    Ok(())
}
