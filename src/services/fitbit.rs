// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit body weight client.

use crate::error::SourceError;
use crate::services::oauth::AuthenticatedClient;
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WeightLogResponse {
    #[serde(default)]
    weight: Vec<WeightLog>,
}

#[derive(Debug, Deserialize)]
struct WeightLog {
    date: Option<String>,
    /// Kilograms for metric accounts.
    weight: Option<f64>,
}

/// Fitbit API client.
#[derive(Clone)]
pub struct FitbitClient {
    client: AuthenticatedClient,
    base_url: String,
}

impl FitbitClient {
    pub fn new(client: AuthenticatedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Most recent weight logged in the 30 days ending `today`, 0.0 if none.
    pub async fn latest_weight(&self, today: NaiveDate) -> Result<f64, SourceError> {
        let url = format!(
            "{}/body/log/weight/date/{}/30d.json",
            self.base_url, today
        );

        let response: WeightLogResponse = self.client.get_json(&url, &[]).await?;

        let latest = response.weight.into_iter().reduce(|best, log| {
            if log.date.as_deref().unwrap_or("") > best.date.as_deref().unwrap_or("") {
                log
            } else {
                best
            }
        });

        Ok(latest.and_then(|log| log.weight).unwrap_or(0.0))
    }
}
