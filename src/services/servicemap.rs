// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Helsinki Service Map client for outdoor ice rink conditions.

use crate::error::SourceError;
use crate::services::REQUEST_TIMEOUT;
use serde::Deserialize;

/// Observation property that carries the ice condition.
const ICE_CONDITION_PROPERTY: &str = "ice_skating_field_condition";

/// Reported when a unit has no ice condition observation.
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Käpylä artificial ice field.
pub const KAPYLA_ICE: u32 = 42185;
/// Käpylä skating rink.
pub const KAPYLA_ICE_RINK: u32 = 41770;
/// Ogeli artificial ice field.
pub const OGELI_ICE: u32 = 78564;

#[derive(Debug, Deserialize)]
struct Unit {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    property: Option<String>,
    name: Option<LocalizedName>,
    value: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalizedName {
    en: Option<String>,
    fi: Option<String>,
}

impl Unit {
    /// Condition text: English name, then Finnish, then the raw value.
    fn ice_condition(&self) -> String {
        let Some(obs) = self
            .observations
            .iter()
            .find(|o| o.property.as_deref() == Some(ICE_CONDITION_PROPERTY))
        else {
            return UNKNOWN_CONDITION.to_string();
        };

        let name = obs.name.as_ref();
        name.and_then(|n| n.en.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| name.and_then(|n| n.fi.clone()).filter(|s| !s.is_empty()))
            .or_else(|| match &obs.value {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(serde_json::Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
            .unwrap_or_else(|| UNKNOWN_CONDITION.to_string())
    }
}

/// Service Map REST client. No authentication.
#[derive(Clone)]
pub struct ServiceMapClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceMapClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Current ice condition for a unit, `"Unknown"` if not reported.
    pub async fn rink_condition(&self, unit_id: u32) -> Result<String, SourceError> {
        let url = format!("{}/unit/{}/", self.base_url, unit_id);

        let response = self
            .http
            .get(&url)
            .query(&[("include", "observations")])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let unit: Unit = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(unit.ice_condition())
    }
}
