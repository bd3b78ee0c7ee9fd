// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is loaded first if present. The
//! same file doubles as the token store, so tokens written by a refresh are
//! picked up again on the next start.

use crate::models::{Credentials, Service};
use std::env;
use std::path::PathBuf;

/// Upstream API base URLs. Overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub oura_api_url: String,
    pub oura_token_url: String,
    pub fitbit_api_url: String,
    pub fitbit_token_url: String,
    pub digitransit_url: String,
    pub servicemap_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            oura_api_url: "https://api.ouraring.com/v2/usercollection".to_string(),
            oura_token_url: "https://api.ouraring.com/oauth/token".to_string(),
            fitbit_api_url: "https://api.fitbit.com/1/user/-".to_string(),
            fitbit_token_url: "https://api.fitbit.com/oauth2/token".to_string(),
            digitransit_url: "https://api.digitransit.fi/routing/v2/hsl/gtfs/v1".to_string(),
            servicemap_url: "https://api.hel.fi/servicemap/v2".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every upstream at one base URL (used with a mock server).
    pub fn all_at(base: &str) -> Self {
        Self {
            oura_api_url: format!("{}/oura", base),
            oura_token_url: format!("{}/oura/oauth/token", base),
            fitbit_api_url: format!("{}/fitbit", base),
            fitbit_token_url: format!("{}/fitbit/oauth2/token", base),
            digitransit_url: format!("{}/digitransit", base),
            servicemap_url: format!("{}/servicemap", base),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Digitransit subscription key (transit and bike data)
    pub digitransit_key: Option<String>,
    /// Oura OAuth credentials as found at startup
    pub oura: Credentials,
    /// Fitbit OAuth credentials as found at startup
    pub fitbit: Credentials,
    /// File that refreshed tokens are written back to
    pub token_file: PathBuf,
    /// LaMetric icon id shown next to each bike frame
    pub lametric_icon: String,
    pub endpoints: Endpoints,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8000,
            digitransit_key: Some("test_digitransit_key".to_string()),
            oura: Credentials {
                client_id: Some("oura_client".to_string()),
                client_secret: Some("oura_secret".to_string()),
                access_token: Some("oura_access".to_string()),
                refresh_token: Some("oura_refresh".to_string()),
            },
            fitbit: Credentials {
                client_id: Some("fitbit_client".to_string()),
                client_secret: Some("fitbit_secret".to_string()),
                access_token: Some("fitbit_access".to_string()),
                refresh_token: Some("fitbit_refresh".to_string()),
            },
            token_file: PathBuf::from(".env.test"),
            lametric_icon: "i1234".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is strictly required: a missing key or token only disables the
    /// metrics that depend on it.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Endpoints::default();

        Ok(Self {
            port: match env::var("PORT") {
                Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT", v))?,
                Err(_) => 8000,
            },
            digitransit_key: optional("DIGITRANSIT_KEY"),
            oura: credentials_from_env(Service::Oura),
            fitbit: credentials_from_env(Service::Fitbit),
            token_file: optional("TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".env")),
            lametric_icon: optional("LAMETRIC_ICON").unwrap_or_else(|| "i1234".to_string()),
            endpoints: Endpoints {
                oura_api_url: optional("OURA_API_URL").unwrap_or(defaults.oura_api_url),
                oura_token_url: optional("OURA_TOKEN_URL").unwrap_or(defaults.oura_token_url),
                fitbit_api_url: optional("FITBIT_API_URL").unwrap_or(defaults.fitbit_api_url),
                fitbit_token_url: optional("FITBIT_TOKEN_URL")
                    .unwrap_or(defaults.fitbit_token_url),
                digitransit_url: optional("DIGITRANSIT_URL").unwrap_or(defaults.digitransit_url),
                servicemap_url: optional("SERVICEMAP_URL").unwrap_or(defaults.servicemap_url),
            },
        })
    }

    /// Startup credentials for an OAuth service.
    pub fn credentials(&self, service: Service) -> &Credentials {
        match service {
            Service::Oura => &self.oura,
            Service::Fitbit => &self.fitbit,
        }
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn credentials_from_env(service: Service) -> Credentials {
    Credentials {
        client_id: optional(&service.env_key("CLIENT_ID")),
        client_secret: optional(&service.env_key("CLIENT_SECRET")),
        access_token: optional(&service.env_key("ACCESS_TOKEN")),
        refresh_token: optional(&service.env_key("REFRESH_TOKEN")),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("OURA_ACCESS_TOKEN", "  oura_token  ");
        env::set_var("FITBIT_CLIENT_ID", "");
        env::set_var("LAMETRIC_ICON", "i999");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.oura.access_token.as_deref(), Some("oura_token"));
        assert_eq!(config.fitbit.client_id, None);
        assert_eq!(config.lametric_icon, "i999");
    }

    #[test]
    fn test_endpoints_all_at() {
        let endpoints = Endpoints::all_at("http://127.0.0.1:1234");
        assert_eq!(endpoints.oura_api_url, "http://127.0.0.1:1234/oura");
        assert_eq!(
            endpoints.fitbit_token_url,
            "http://127.0.0.1:1234/fitbit/oauth2/token"
        );
    }
}
