//! Matrix Intelligence landing site.
//!
//! Serves the landing page and the JSON endpoints behind it: plan
//! selection, manual USDT payment confirmation, demo requests, and sample /
//! generated report downloads. All state lives in memory and resets on
//! restart.

mod analytics;
mod api;
mod config;
mod demo;
mod errors;
mod notify;
mod payment;
mod plans;
mod prompt;
mod report;
mod site;
mod views;
mod visitor;

#[cfg(test)]
mod test_flows;

use std::sync::Arc;

use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use analytics::Analytics;
use config::Config;
use report::template::TemplateStore;
use report::ReportGenerator;
use site::SiteController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Shared by the rasterizer and the analytics hook.
    let client = Client::builder()
        .timeout(config.rasterizer_timeout)
        .build()?;

    let templates = match &config.templates_dir {
        Some(dir) => TemplateStore::load(dir).await,
        None => TemplateStore::builtin(),
    };
    let rasterizer = report::rasterizer::select(config.rasterizer_url.as_deref(), client.clone());
    let reports = ReportGenerator::new(templates, rasterizer);
    let analytics = Analytics::new(client, config.analytics_url.clone());

    info!(
        validation = ?config.validation_mode,
        visitor_idle = ?config.visitor_idle,
        sample = %config.sample_report_path.display(),
        analytics = analytics.is_enabled(),
        "Site configured"
    );

    let site = Arc::new(SiteController::new(config.clone(), reports, analytics)?);

    let app = api::router(site)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.site_port);
    info!("Site listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
