// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard API Server
//!
//! Serves the aggregated dashboard snapshot and LaMetric frames.

use dashboard_backend::{
    config::Config,
    models::Service,
    services::{DashboardService, EnvFileStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting dashboard API");

    for service in Service::ALL {
        let creds = config.credentials(service);
        if creds.access_token.is_none() {
            tracing::warn!(service = %service, "No access token configured, metrics disabled");
        } else if creds.refresh_token.is_none() || creds.client_secret.is_none() {
            tracing::warn!(service = %service, "Token refresh not configured");
        }
    }
    if config.digitransit_key.is_none() {
        tracing::warn!("DIGITRANSIT_KEY not set, dashboard requests will fail");
    }

    // Token store, seeded from config and kept in sync with the token file
    let store = EnvFileStore::open(
        &config.token_file,
        Service::ALL.map(|s| (s, config.credentials(s).clone())),
    )?;
    tracing::info!(path = %store.path().display(), "Token store initialized");

    let dashboard = DashboardService::from_config(&config, Arc::new(store));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        dashboard,
    });

    // Build router
    let app = dashboard_backend::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dashboard_backend=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
