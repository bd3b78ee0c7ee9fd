// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard routes: full snapshot and LaMetric frames.

use crate::error::Result;
use crate::models::{LaMetricFrames, Snapshot};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_snapshot))
        .route("/lametric", get(get_lametric))
}

/// Full dashboard snapshot.
async fn get_snapshot(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>> {
    let today = chrono::Local::now().date_naive();
    let snapshot = state.dashboard.snapshot(today).await?;
    Ok(Json(snapshot))
}

/// Bike counts in LaMetric "My Data DIY" format.
async fn get_lametric(State(state): State<Arc<AppState>>) -> Result<Json<LaMetricFrames>> {
    let frames = state.dashboard.lametric(&state.config.lametric_icon).await?;
    Ok(Json(frames))
}
