// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential storage for OAuth services.
//!
//! Records live in memory and are written back to a dotenv-style file when a
//! refresh rotates the tokens. The config layer loads the same file at
//! startup, so a restart picks up the latest tokens.

use crate::error::SourceError;
use crate::models::{Credentials, Service, TokenPair};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Storage for per-service credential records.
///
/// `set` must not return before the new tokens are durable.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current record for a service (empty if never configured).
    async fn get(&self, service: Service) -> Credentials;

    /// Replace both tokens for a service and persist them.
    async fn set(&self, service: Service, tokens: &TokenPair) -> Result<(), SourceError>;
}

/// Credential store backed by a `.env` file.
pub struct EnvFileStore {
    path: PathBuf,
    records: DashMap<Service, Credentials>,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl EnvFileStore {
    /// Create a store seeded with startup credentials.
    ///
    /// Token values already present in `path` take precedence over the seeds,
    /// since the file is only ever written with freshly rotated tokens.
    pub fn open(
        path: impl Into<PathBuf>,
        seeds: impl IntoIterator<Item = (Service, Credentials)>,
    ) -> Result<Self, SourceError> {
        let path = path.into();
        let records: DashMap<Service, Credentials> = seeds.into_iter().collect();

        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|e| SourceError::Storage(e.to_string()))?;
                    overlay(&records, &key, value);
                }
                tracing::debug!(path = %path.display(), "Loaded token file");
            }
            Err(e) if e.not_found() => {
                tracing::debug!(path = %path.display(), "No token file yet");
            }
            Err(e) => return Err(SourceError::Storage(e.to_string())),
        }

        Ok(Self {
            path,
            records,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the token lines for `service`, keeping all other lines.
    async fn persist(&self, service: Service, tokens: &TokenPair) -> Result<(), SourceError> {
        let existing = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(SourceError::Storage(e.to_string())),
        };

        let updated = set_keys(
            &existing,
            &[
                (service.env_key("ACCESS_TOKEN"), tokens.access_token.as_str()),
                (service.env_key("REFRESH_TOKEN"), tokens.refresh_token.as_str()),
            ],
        );

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, updated)
            .await
            .map_err(|e| SourceError::Storage(format!("write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SourceError::Storage(format!("rename {}: {}", tmp.display(), e)))?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for EnvFileStore {
    async fn get(&self, service: Service) -> Credentials {
        self.records
            .get(&service)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    async fn set(&self, service: Service, tokens: &TokenPair) -> Result<(), SourceError> {
        let _guard = self.write_lock.lock().await;

        // File first: if it fails the in-memory record stays untouched.
        self.persist(service, tokens).await?;
        self.records.entry(service).or_default().apply(tokens);

        tracing::info!(service = %service, path = %self.path.display(), "Persisted refreshed tokens");
        Ok(())
    }
}

/// Apply one `KEY=value` pair from the token file to the matching record.
fn overlay(records: &DashMap<Service, Credentials>, key: &str, value: String) {
    for service in Service::ALL {
        let Some(field) = key
            .strip_prefix(service.env_prefix())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            continue;
        };

        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }

        let mut record = records.entry(service).or_default();
        match field {
            "ACCESS_TOKEN" => record.access_token = Some(value),
            "REFRESH_TOKEN" => record.refresh_token = Some(value),
            _ => {}
        }
        return;
    }
}

/// Replace `KEY=...` lines in dotenv content, appending keys that are absent.
fn set_keys(content: &str, pairs: &[(String, &str)]) -> String {
    let mut written = vec![false; pairs.len()];
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            for (i, (key, value)) in pairs.iter().enumerate() {
                let matches = assignment
                    .strip_prefix(key.as_str())
                    .is_some_and(|rest| rest.trim_start().starts_with('='));
                if matches {
                    written[i] = true;
                    return format!("{}={}", key, value);
                }
            }
            line.to_string()
        })
        .collect();

    for (i, (key, value)) in pairs.iter().enumerate() {
        if !written[i] {
            lines.push(format!("{}={}", key, value));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    #[test]
    fn test_set_keys_replaces_in_place() {
        let content = "PORT=8000\nOURA_ACCESS_TOKEN=old\n# comment\nOURA_REFRESH_TOKEN = old_r\n";
        let out = set_keys(
            content,
            &[
                ("OURA_ACCESS_TOKEN".to_string(), "new"),
                ("OURA_REFRESH_TOKEN".to_string(), "new_r"),
            ],
        );
        assert_eq!(
            out,
            "PORT=8000\nOURA_ACCESS_TOKEN=new\n# comment\nOURA_REFRESH_TOKEN=new_r\n"
        );
    }

    #[test]
    fn test_set_keys_appends_missing() {
        let out = set_keys("PORT=8000", &[("FITBIT_ACCESS_TOKEN".to_string(), "abc")]);
        assert_eq!(out, "PORT=8000\nFITBIT_ACCESS_TOKEN=abc\n");
    }

    #[test]
    fn test_set_keys_does_not_touch_prefixed_keys() {
        let out = set_keys(
            "OURA_ACCESS_TOKEN_OLD=keep\n",
            &[("OURA_ACCESS_TOKEN".to_string(), "new")],
        );
        assert_eq!(out, "OURA_ACCESS_TOKEN_OLD=keep\nOURA_ACCESS_TOKEN=new\n");
    }

    #[tokio::test]
    async fn test_set_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "DIGITRANSIT_KEY=abc\nFITBIT_ACCESS_TOKEN=old\n").unwrap();

        let seed = Credentials {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            access_token: Some("seed".to_string()),
            refresh_token: Some("seed_r".to_string()),
        };
        let store = EnvFileStore::open(&path, [(Service::Fitbit, seed)]).unwrap();

        // File value overrides the seed
        let current = store.get(Service::Fitbit).await;
        assert_eq!(current.access_token.as_deref(), Some("old"));
        assert_eq!(current.refresh_token.as_deref(), Some("seed_r"));

        store
            .set(Service::Fitbit, &tokens("new", "new_r"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "DIGITRANSIT_KEY=abc\nFITBIT_ACCESS_TOKEN=new\nFITBIT_REFRESH_TOKEN=new_r\n"
        );

        let reopened = EnvFileStore::open(&path, []).unwrap();
        let reloaded = reopened.get(Service::Fitbit).await;
        assert_eq!(reloaded.access_token.as_deref(), Some("new"));
        assert_eq!(reloaded.refresh_token.as_deref(), Some("new_r"));
        assert_eq!(reloaded.client_id, None);
    }

    #[tokio::test]
    async fn test_set_failure_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join(".env");

        let seed = Credentials {
            access_token: Some("old".to_string()),
            refresh_token: Some("old_r".to_string()),
            ..Default::default()
        };
        let store = EnvFileStore::open(&path, [(Service::Oura, seed.clone())]).unwrap();

        let result = store.set(Service::Oura, &tokens("new", "new_r")).await;
        assert!(matches!(result, Err(SourceError::Storage(_))));
        assert_eq!(store.get(Service::Oura).await, seed);
    }

    #[tokio::test]
    async fn test_unknown_service_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EnvFileStore::open(dir.path().join(".env"), []).unwrap();
        assert_eq!(store.get(Service::Oura).await, Credentials::default());
    }
}
