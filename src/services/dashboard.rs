// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation: calls every source and flattens the results.
//!
//! Sources are queried one after another. Bike counts are the only source
//! whose failure fails the whole response; every other metric falls back to
//! a placeholder.

use crate::config::Config;
use crate::error::SourceError;
use crate::format::{format_departures, format_sleep, format_weight, meters_to_km};
use crate::models::{LaMetricFrames, Snapshot};
use crate::services::digitransit::{
    DepartureQuery, DigitransitClient, BUS_66_TO_PALOHEINA, TRAM_1_TO_EIRA,
};
use crate::services::fitbit::FitbitClient;
use crate::services::oauth::{AuthenticatedClient, OAuthProvider};
use crate::services::oura::{ActivitySummary, OuraClient};
use crate::services::servicemap::{ServiceMapClient, KAPYLA_ICE, KAPYLA_ICE_RINK, OGELI_ICE};
use crate::services::token_store::CredentialStore;
use chrono::NaiveDate;
use std::sync::Arc;

/// Rink condition shown when the lookup itself failed.
const RINK_ERROR: &str = "Error";

/// Aggregates all sources into dashboard responses.
#[derive(Clone)]
pub struct DashboardService {
    oura: OuraClient,
    fitbit: FitbitClient,
    digitransit: DigitransitClient,
    servicemap: ServiceMapClient,
}

impl DashboardService {
    pub fn new(
        oura: OuraClient,
        fitbit: FitbitClient,
        digitransit: DigitransitClient,
        servicemap: ServiceMapClient,
    ) -> Self {
        Self {
            oura,
            fitbit,
            digitransit,
            servicemap,
        }
    }

    /// Build every client from configuration, sharing one HTTP connection pool.
    pub fn from_config(config: &Config, store: Arc<dyn CredentialStore>) -> Self {
        let http = reqwest::Client::new();
        let endpoints = &config.endpoints;

        let oura = AuthenticatedClient::new(
            http.clone(),
            OAuthProvider::oura(&endpoints.oura_token_url),
            store.clone(),
        );
        let fitbit = AuthenticatedClient::new(
            http.clone(),
            OAuthProvider::fitbit(&endpoints.fitbit_token_url),
            store,
        );

        Self::new(
            OuraClient::new(oura, &endpoints.oura_api_url),
            FitbitClient::new(fitbit, &endpoints.fitbit_api_url),
            DigitransitClient::new(
                http.clone(),
                &endpoints.digitransit_url,
                config.digitransit_key.clone(),
            ),
            ServiceMapClient::new(http, &endpoints.servicemap_url),
        )
    }

    /// Full dashboard snapshot for `today`.
    pub async fn snapshot(&self, today: NaiveDate) -> Result<Snapshot, SourceError> {
        let counts = self.digitransit.bike_counts().await?;

        let biked_m = or_placeholder(
            "cycling_distance",
            self.oura.cycling_distance_this_year(today).await,
            0.0,
        );
        let sleep = or_placeholder("sleep", self.oura.sleep(today).await, None);
        let activity = or_placeholder(
            "daily_activity",
            self.oura.activity(today).await,
            ActivitySummary::default(),
        );
        let readiness = or_placeholder("readiness", self.oura.readiness(today).await, 0);
        let weight = or_placeholder("weight", self.fitbit.latest_weight(today).await, 0.0);

        let tram = self.departures("tram_1_to_eira", &TRAM_1_TO_EIRA).await;
        let bus = self
            .departures("bus_66_to_paloheina_ice_rink", &BUS_66_TO_PALOHEINA)
            .await;

        let (sleep_seconds, sleep_score) = sleep
            .map(|s| (s.total_sleep_duration, s.score))
            .unwrap_or((0, 0));

        Ok(Snapshot {
            biked_km: meters_to_km(biked_m),
            pohjolankatu_alepabikes: counts.pohjolankatu.bikes,
            koskelantie_alepabikes: counts.koskelantie.bikes,
            steps: activity.steps,
            activity_percentage: activity.score,
            readiness,
            sleep_time: format_sleep(sleep_seconds),
            sleep_score,
            calories_consumed: activity.total_calories,
            weight: format_weight(weight),
            tram_1_to_eira: tram,
            bus_66_to_paloheina_ice_rink: bus,
            kapyla_ice: self.rink(KAPYLA_ICE).await,
            kapyla_ice_rink: self.rink(KAPYLA_ICE_RINK).await,
            ogeli_ice: self.rink(OGELI_ICE).await,
        })
    }

    /// Bike counts as LaMetric frames.
    pub async fn lametric(&self, icon: &str) -> Result<LaMetricFrames, SourceError> {
        let counts = self.digitransit.bike_counts().await?;
        Ok(LaMetricFrames::for_bikes(&counts, icon))
    }

    async fn departures(&self, metric: &'static str, query: &DepartureQuery<'_>) -> String {
        let departures = or_placeholder(metric, self.digitransit.departures(query).await, vec![]);
        format_departures(&departures)
    }

    async fn rink(&self, unit_id: u32) -> String {
        match self.servicemap.rink_condition(unit_id).await {
            Ok(condition) => condition,
            Err(e) => {
                tracing::warn!(unit_id, error = %e, "Rink condition unavailable");
                RINK_ERROR.to_string()
            }
        }
    }
}

/// Swallow a failed metric, logging why it is missing.
fn or_placeholder<T>(metric: &'static str, result: Result<T, SourceError>, placeholder: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) if e.is_configuration() => {
            tracing::debug!(metric, error = %e, "Metric skipped");
            placeholder
        }
        Err(e) => {
            tracing::warn!(metric, error = %e, "Metric unavailable, using placeholder");
            placeholder
        }
    }
}
