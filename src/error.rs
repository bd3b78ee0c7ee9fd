// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types: upstream source failures and HTTP-facing API errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure of a single upstream source call.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Required API key missing; no request was made.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// No access token available; no request was made.
    #[error("{0} is not authenticated")]
    NotAuthenticated(&'static str),

    /// Client id, client secret or refresh token missing for a refresh.
    #[error("{0} token refresh is misconfigured: missing {1}")]
    Misconfigured(&'static str, &'static str),

    /// Token endpoint rejected the refresh or returned an unusable body.
    #[error("{0} token refresh failed: {1}")]
    RefreshFailed(&'static str, String),

    /// Still unauthorized after a refresh, or the key was rejected.
    #[error("{0} returned 401 Unauthorized")]
    Unauthorized(&'static str),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection failure or timeout.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisting refreshed tokens failed.
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl SourceError {
    /// True for failures that happen before any network I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SourceError::NotConfigured(_)
                | SourceError::NotAuthenticated(_)
                | SourceError::Misconfigured(..)
        )
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A source whose failure is fatal to the whole response.
    #[error("Upstream error: {0}")]
    Upstream(#[from] SourceError),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "Upstream source failed");
                (StatusCode::BAD_GATEWAY, "upstream_error", Some(err.to_string()))
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
