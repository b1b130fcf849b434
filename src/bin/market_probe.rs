//! One-off fetch + extraction; prints the report as JSON.
//!
//! Usage: `market-probe [en|ar]`

use anyhow::Context;
use chrono::Local;
use egypt_gold_dashboard::{ai, config::DashboardConfig, Language};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = DashboardConfig::load_default()?;
    let language = match std::env::args().nth(1) {
        Some(arg) => Language::parse(&arg).context("language must be 'en' or 'ar'")?,
        None => cfg.ui.language,
    };

    let client = ai::build_client(&cfg.ai)?;
    let report = ai::fetch_market_report(client.as_ref(), language, || {
        Local::now().fixed_offset()
    })
    .await
    .with_context(|| format!("fetch via {}", client.provider_name()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
