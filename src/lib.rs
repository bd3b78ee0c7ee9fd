// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dashboard backend: aggregates sleep, activity, weight, transit and ice
//! rink data into flat JSON for a dashboard client and a LaMetric display.

pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::DashboardService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub dashboard: DashboardService,
}
