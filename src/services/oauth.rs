// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 bearer client with refresh-on-401.
//!
//! Handles:
//! - Bearer-authenticated GET requests returning JSON
//! - One token refresh and one retry when the provider answers 401
//! - Provider-specific client authentication at the token endpoint
//! - Serialized refreshes so concurrent 401s rotate the tokens only once

use crate::error::SourceError;
use crate::models::{Credentials, Service, TokenPair};
use crate::services::token_store::CredentialStore;
use crate::services::REQUEST_TIMEOUT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How the client proves its identity to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// `Authorization: Basic base64(client_id:client_secret)`
    Basic,
    /// `client_id` and `client_secret` as form parameters
    FormBody,
}

/// Token endpoint details for one provider.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub service: Service,
    /// Human-readable name used in errors and logs.
    pub name: &'static str,
    pub token_url: String,
    pub client_auth: ClientAuth,
}

impl OAuthProvider {
    /// Oura expects client credentials in the form body.
    pub fn oura(token_url: impl Into<String>) -> Self {
        Self {
            service: Service::Oura,
            name: "Oura",
            token_url: token_url.into(),
            client_auth: ClientAuth::FormBody,
        }
    }

    /// Fitbit expects client credentials as HTTP Basic auth.
    pub fn fitbit(token_url: impl Into<String>) -> Self {
        Self {
            service: Service::Fitbit,
            name: "Fitbit",
            token_url: token_url.into(),
            client_auth: ClientAuth::Basic,
        }
    }
}

/// Token endpoint response. Fields we don't use are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Outcome of a single GET attempt.
enum Attempt<T> {
    Done(T),
    Unauthorized,
}

/// Where one logical request stands.
enum AuthState {
    /// Holding a token; `retried` is set once a refresh has been spent.
    Authenticated { token: String, retried: bool },
    /// The provider rejected `rejected`; a refresh is due.
    Refreshing { rejected: String },
}

/// Bearer-token client for one OAuth2-protected API.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    provider: OAuthProvider,
    store: Arc<dyn CredentialStore>,
    /// Serializes refreshes for this provider.
    refresh_lock: Arc<Mutex<()>>,
}

impl AuthenticatedClient {
    pub fn new(
        http: reqwest::Client,
        provider: OAuthProvider,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            provider,
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn provider(&self) -> &OAuthProvider {
        &self.provider
    }

    /// GET `url` with bearer auth and parse the JSON body.
    ///
    /// Fails without network I/O when no access token is configured. A 401
    /// triggers at most one refresh followed by at most one retry.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let Some(token) = self.store.get(self.provider.service).await.access_token else {
            return Err(SourceError::NotAuthenticated(self.provider.name));
        };

        let mut state = AuthState::Authenticated {
            token,
            retried: false,
        };

        loop {
            state = match state {
                AuthState::Authenticated { token, retried } => {
                    match self.send(url, query, &token).await? {
                        Attempt::Done(body) => return Ok(body),
                        Attempt::Unauthorized if retried => {
                            tracing::warn!(
                                provider = self.provider.name,
                                url,
                                "Still unauthorized after token refresh"
                            );
                            return Err(SourceError::Unauthorized(self.provider.name));
                        }
                        Attempt::Unauthorized => AuthState::Refreshing { rejected: token },
                    }
                }
                AuthState::Refreshing { rejected } => AuthState::Authenticated {
                    token: self.refresh(&rejected).await?,
                    retried: true,
                },
            };
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<Attempt<T>, SourceError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(provider = self.provider.name, url, "Access token rejected (401)");
            return Ok(Attempt::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map(Attempt::Done)
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    /// Replace a rejected access token, returning the token to retry with.
    ///
    /// The new pair is persisted before this returns. If another request
    /// already rotated the tokens while we waited for the lock, its access
    /// token is returned without contacting the provider.
    pub async fn refresh(&self, rejected: &str) -> Result<String, SourceError> {
        let _guard = self.refresh_lock.lock().await;

        let credentials = self.store.get(self.provider.service).await;
        if let Some(current) = credentials.access_token.as_deref() {
            if current != rejected {
                tracing::debug!(
                    provider = self.provider.name,
                    "Tokens already refreshed by another request"
                );
                return Ok(current.to_string());
            }
        }

        tracing::info!(provider = self.provider.name, "Refreshing access token");
        let tokens = self.exchange_refresh_token(&credentials).await?;
        self.store.set(self.provider.service, &tokens).await?;

        tracing::info!(provider = self.provider.name, "Token refreshed and persisted");
        Ok(tokens.access_token)
    }

    /// Exchange the refresh token at the provider's token endpoint.
    async fn exchange_refresh_token(
        &self,
        credentials: &Credentials,
    ) -> Result<TokenPair, SourceError> {
        let name = self.provider.name;
        let client_id = credentials
            .client_id
            .as_deref()
            .ok_or(SourceError::Misconfigured(name, "client id"))?;
        let client_secret = credentials
            .client_secret
            .as_deref()
            .ok_or(SourceError::Misconfigured(name, "client secret"))?;
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(SourceError::Misconfigured(name, "refresh token"))?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let request = self
            .http
            .post(&self.provider.token_url)
            .timeout(REQUEST_TIMEOUT);

        let request = match self.provider.client_auth {
            ClientAuth::Basic => request.basic_auth(client_id, Some(client_secret)),
            ClientAuth::FormBody => {
                form.push(("client_id", client_id));
                form.push(("client_secret", client_secret));
                request
            }
        };

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| SourceError::RefreshFailed(name, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(provider = name, status = %status, body = %body, "Token refresh rejected");
            return Err(SourceError::RefreshFailed(
                name,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::RefreshFailed(name, format!("JSON parse error: {}", e)))?;

        match (body.access_token, body.refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                Ok(TokenPair {
                    access_token,
                    refresh_token,
                })
            }
            _ => Err(SourceError::RefreshFailed(
                name,
                "response must contain both access_token and refresh_token".to_string(),
            )),
        }
    }
}
