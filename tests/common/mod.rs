// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use dashboard_backend::config::{Config, Endpoints};
use dashboard_backend::error::SourceError;
use dashboard_backend::models::{Credentials, Service, TokenPair};
use dashboard_backend::routes::create_router;
use dashboard_backend::services::{CredentialStore, DashboardService, EnvFileStore};
use dashboard_backend::AppState;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Config with every upstream pointed at `server_url`.
#[allow(dead_code)]
pub fn test_config(server_url: &str, token_file: &Path) -> Config {
    Config {
        endpoints: Endpoints::all_at(server_url),
        token_file: token_file.to_path_buf(),
        ..Config::default()
    }
}

/// Create a test app whose token store is seeded from `config`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(config: Config) -> (axum::Router, Arc<AppState>) {
    let store = EnvFileStore::open(
        &config.token_file,
        Service::ALL.map(|s| (s, config.credentials(s).clone())),
    )
    .expect("Failed to open token store");

    let dashboard = DashboardService::from_config(&config, Arc::new(store));
    let state = Arc::new(AppState { config, dashboard });

    (create_router(state.clone()), state)
}

/// In-memory credential store that records every `set`.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    pub records: Mutex<HashMap<Service, Credentials>>,
    pub sets: Mutex<Vec<(Service, TokenPair)>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn with(service: Service, credentials: Credentials) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(service, credentials);
        store
    }

    pub fn set_count(&self) -> usize {
        self.sets.lock().unwrap().len()
    }

    pub fn current(&self, service: Service) -> Credentials {
        self.records
            .lock()
            .unwrap()
            .get(&service)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn get(&self, service: Service) -> Credentials {
        self.current(service)
    }

    async fn set(&self, service: Service, tokens: &TokenPair) -> Result<(), SourceError> {
        if self.fail_writes {
            return Err(SourceError::Storage("disk full".to_string()));
        }
        self.sets.lock().unwrap().push((service, tokens.clone()));
        self.records
            .lock()
            .unwrap()
            .entry(service)
            .or_default()
            .apply(tokens);
        Ok(())
    }
}

/// Full credential record with the given tokens.
#[allow(dead_code)]
pub fn credentials(access: &str, refresh: &str) -> Credentials {
    Credentials {
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
        access_token: Some(access.to_string()),
        refresh_token: Some(refresh.to_string()),
    }
}
