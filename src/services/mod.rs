// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream clients and aggregation.

pub mod dashboard;
pub mod digitransit;
pub mod fitbit;
pub mod oauth;
pub mod oura;
pub mod servicemap;
pub mod token_store;

use std::time::Duration;

pub use dashboard::DashboardService;
pub use digitransit::DigitransitClient;
pub use fitbit::FitbitClient;
pub use oauth::{AuthenticatedClient, ClientAuth, OAuthProvider};
pub use oura::OuraClient;
pub use servicemap::ServiceMapClient;
pub use token_store::{CredentialStore, EnvFileStore};

/// Per-request timeout for upstream calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
