use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the scheduler series so they
    /// show up on `/metrics` before the first fetch.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("dashboard_fetch_total", "Market data fetches started.");
        describe_counter!(
            "dashboard_fetch_errors_total",
            "Market data fetches that failed (config or transport)."
        );
        describe_counter!(
            "dashboard_fetch_skipped_total",
            "Refresh requests skipped because a fetch was in flight."
        );
        describe_histogram!("dashboard_fetch_ms", "Fetch + extraction time in milliseconds.");
        describe_gauge!(
            "dashboard_last_success_ts",
            "Unix ts of the last successful refresh."
        );

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
