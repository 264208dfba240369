mod analysis;
mod cache;
mod config;
mod dashboard;
mod error;
mod harvest;
mod model;
mod parser;
mod render;
mod search;
mod server;
mod session;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scrape_common::http::SearchClient;
use scrape_common::webdriver::WebDriverLauncher;

use cache::SearchCache;
use config::Config;
use dashboard::Dashboard;
use harvest::ReviewHarvester;
use search::ProductSearch;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting review dashboard");

    let config = Config::from_env()?;
    info!(
        bind = %config.bind_addr,
        store = %config.http.base_url,
        webdriver = %config.webdriver_url,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "configuration loaded"
    );

    let client = SearchClient::new(config.http.clone())?;
    let launcher = WebDriverLauncher::new(&config.webdriver_url, config.review_settle);

    let dashboard = Dashboard::new(
        ProductSearch::new(Arc::new(client)),
        ReviewHarvester::new(Arc::new(launcher), &config.http.base_url),
        SearchCache::new(config.cache_ttl),
    );
    let app = server::create_router(AppState::new(dashboard));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await
        .context("http server error")?;

    info!("dashboard stopped");
    Ok(())
}
