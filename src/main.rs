//! Egyptian gold dashboard backend — binary entrypoint.
//! Boots the Axum HTTP server with the refresh scheduler running behind it.

use egypt_gold_dashboard::config::DashboardConfig;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    egypt_gold_dashboard::init_tracing();

    let cfg = DashboardConfig::load_default()?;
    let service = egypt_gold_dashboard::build_service(&cfg)?;

    Ok(service.router.into())
}
