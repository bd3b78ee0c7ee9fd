// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Oura v2 usercollection client (sleep, activity, readiness, workouts).
//!
//! Every query is a date range; "latest" means the document with the
//! greatest `day`.

use crate::error::SourceError;
use crate::services::oauth::AuthenticatedClient;
use chrono::{Datelike, Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Days of history fetched for "latest" lookups.
const LOOKBACK_DAYS: i64 = 7;

/// Collection envelope shared by all usercollection endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Collection<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
struct SleepDocument {
    day: Option<String>,
    total_sleep_duration: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoredDocument {
    day: Option<String>,
    score: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkoutDocument {
    activity: Option<String>,
    distance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ActivityDocument {
    day: Option<String>,
    score: Option<u32>,
    steps: Option<u64>,
    total_calories: Option<u64>,
}

/// Latest night of sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepSummary {
    pub day: String,
    pub total_sleep_duration: u64,
    /// Daily sleep score for the same day, 0 when missing.
    pub score: u32,
}

/// Figures derived from the daily activity documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    /// `total_calories` (active + resting) of the latest document.
    pub total_calories: u64,
    /// Steps for today, or the latest day if today has no document yet.
    pub steps: u64,
    pub score: u32,
}

/// Oura API client.
#[derive(Clone)]
pub struct OuraClient {
    client: AuthenticatedClient,
    base_url: String,
}

impl OuraClient {
    pub fn new(client: AuthenticatedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Latest sleep session and its daily score. `None` if no sessions.
    pub async fn sleep(&self, today: NaiveDate) -> Result<Option<SleepSummary>, SourceError> {
        let sessions: Vec<SleepDocument> = self.collection("sleep", lookback(today), today).await?;
        let daily: Vec<ScoredDocument> =
            self.collection("daily_sleep", lookback(today), today).await?;

        let Some(latest) = latest_by_day(sessions, |d| d.day.as_deref()) else {
            return Ok(None);
        };

        let day = latest.day.unwrap_or_default();
        let score = daily
            .iter()
            .find(|d| d.day.as_deref() == Some(day.as_str()))
            .and_then(|d| d.score)
            .unwrap_or(0);

        Ok(Some(SleepSummary {
            day,
            total_sleep_duration: latest.total_sleep_duration.unwrap_or(0),
            score,
        }))
    }

    /// Total meters of cycling workouts since January 1st.
    pub async fn cycling_distance_this_year(&self, today: NaiveDate) -> Result<f64, SourceError> {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let workouts: Vec<WorkoutDocument> = self.collection("workout", start, today).await?;

        Ok(workouts
            .iter()
            .filter(|w| w.activity.as_deref() == Some("cycling"))
            .filter_map(|w| w.distance)
            .sum())
    }

    /// Calories, steps and activity score from the daily activity documents.
    pub async fn activity(&self, today: NaiveDate) -> Result<ActivitySummary, SourceError> {
        let docs: Vec<ActivityDocument> =
            self.collection("daily_activity", lookback(today), today).await?;

        let today_str = today.to_string();
        let todays = docs
            .iter()
            .find(|d| d.day.as_deref() == Some(today_str.as_str()))
            .cloned();
        let Some(latest) = latest_by_day(docs, |d| d.day.as_deref()) else {
            return Ok(ActivitySummary::default());
        };
        let for_steps = todays.as_ref().unwrap_or(&latest);

        Ok(ActivitySummary {
            total_calories: latest.total_calories.unwrap_or(0),
            steps: for_steps.steps.unwrap_or(0),
            score: for_steps.score.unwrap_or(0),
        })
    }

    /// Latest daily readiness score, 0 when there is none.
    pub async fn readiness(&self, today: NaiveDate) -> Result<u32, SourceError> {
        let docs: Vec<ScoredDocument> =
            self.collection("daily_readiness", lookback(today), today).await?;

        Ok(latest_by_day(docs, |d| d.day.as_deref())
            .and_then(|d| d.score)
            .unwrap_or(0))
    }

    async fn collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<T>, SourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let query = [
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
        ];

        let collection: Collection<T> = self.client.get_json(&url, &query).await?;
        Ok(collection.data)
    }
}

fn lookback(today: NaiveDate) -> NaiveDate {
    today - Duration::days(LOOKBACK_DAYS)
}

/// Document with the greatest day string (ISO dates sort lexically).
/// Ties keep the earliest document in response order.
fn latest_by_day<T>(docs: Vec<T>, day: impl Fn(&T) -> Option<&str>) -> Option<T> {
    docs.into_iter().reduce(|best, doc| {
        if day(&doc).unwrap_or("") > day(&best).unwrap_or("") {
            doc
        } else {
            best
        }
    })
}
