// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Digitransit routing API client (HSL GraphQL).
//!
//! Handles:
//! - City bike counts for the two watched rental stations
//! - Upcoming departures at a stop, filtered by route and headsign

use crate::error::SourceError;
use crate::models::{BikeCounts, StationBikes};
use crate::services::REQUEST_TIMEOUT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// The bike query is slower than the rest; give it more time.
const BIKE_QUERY_TIMEOUT: Duration = Duration::from_secs(20);

const BIKE_COUNTS_QUERY: &str = r#"
{
  pohjolankatu: vehicleRentalStation(id: "smoove:145") {
    name
    availableVehicles { byType { count vehicleType { formFactor } } }
  }
  koskelantie: vehicleRentalStation(id: "smoove:142") {
    name
    availableVehicles { byType { count vehicleType { formFactor } } }
  }
}
"#;

const STOP_TIMES_QUERY: &str = r#"
query GetStopTimes($stopId: String!) {
  stop(id: $stopId) {
    name
    code
    stoptimesWithoutPatterns(numberOfDepartures: 10) {
      scheduledDeparture
      realtimeDeparture
      realtime
      trip {
        route {
          shortName
          longName
        }
        tripHeadsign
      }
    }
  }
}
"#;

/// A departure filter: stop, route and optional headsign keyword.
#[derive(Debug, Clone, Copy)]
pub struct DepartureQuery<'a> {
    /// Full GTFS id, e.g. `HSL:1250428`
    pub stop_id: &'a str,
    /// Route short name prefix; `"1"` also matches `"1T"`.
    pub route: &'a str,
    /// Case-insensitive substring of the trip headsign.
    pub headsign: Option<&'a str>,
    pub limit: usize,
}

/// Tram 1 towards Eira. The stop only serves one direction.
pub const TRAM_1_TO_EIRA: DepartureQuery<'static> = DepartureQuery {
    stop_id: "HSL:1250428",
    route: "1",
    headsign: None,
    limit: 3,
};

/// Bus 66 towards the Paloheinä ice rink.
pub const BUS_66_TO_PALOHEINA: DepartureQuery<'static> = DepartureQuery {
    stop_id: "HSL:1250103",
    route: "66",
    headsign: Some("Paloheinä"),
    limit: 3,
};

// ─── Response shapes ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BikeStationsData {
    pohjolankatu: Option<RentalStation>,
    koskelantie: Option<RentalStation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentalStation {
    name: Option<String>,
    available_vehicles: Option<AvailableVehicles>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableVehicles {
    #[serde(default)]
    by_type: Vec<VehicleTypeCount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleTypeCount {
    count: Option<u32>,
    vehicle_type: Option<VehicleType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleType {
    form_factor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StopData {
    stop: Option<Stop>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stop {
    #[serde(default)]
    stoptimes_without_patterns: Vec<StopTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopTime {
    scheduled_departure: Option<u32>,
    realtime_departure: Option<u32>,
    trip: Option<Trip>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Trip {
    route: Option<Route>,
    trip_headsign: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    short_name: Option<String>,
}

impl RentalStation {
    /// Sum of available vehicles whose form factor is `BICYCLE`.
    fn bicycles(&self) -> u32 {
        self.available_vehicles
            .as_ref()
            .map(|v| {
                v.by_type
                    .iter()
                    .filter(|t| {
                        t.vehicle_type
                            .as_ref()
                            .and_then(|vt| vt.form_factor.as_deref())
                            == Some("BICYCLE")
                    })
                    .map(|t| t.count.unwrap_or(0))
                    .fold(0u32, u32::saturating_add)
            })
            .unwrap_or(0)
    }

    fn into_station(self, fallback_name: &str) -> StationBikes {
        let bikes = self.bicycles();
        StationBikes {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            bikes,
        }
    }
}

impl StopTime {
    /// Realtime estimate if present and non-zero, else the timetable.
    fn departure(&self) -> Option<u32> {
        self.realtime_departure
            .filter(|&t| t != 0)
            .or(self.scheduled_departure)
    }

    fn matches(&self, query: &DepartureQuery<'_>) -> bool {
        let Some(trip) = &self.trip else {
            return false;
        };

        let route = trip
            .route
            .as_ref()
            .and_then(|r| r.short_name.as_deref())
            .unwrap_or("");
        if !route.starts_with(query.route) {
            return false;
        }

        match query.headsign {
            Some(keyword) => trip
                .trip_headsign
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            None => true,
        }
    }
}

/// Departure times (seconds since midnight) matching `query`, in API order.
fn select_departures(stop: &Stop, query: &DepartureQuery<'_>) -> Vec<u32> {
    stop.stoptimes_without_patterns
        .iter()
        .filter(|st| st.matches(query))
        .filter_map(StopTime::departure)
        .take(query.limit)
        .collect()
}

// ─── Client ──────────────────────────────────────────────────

/// Digitransit GraphQL client.
#[derive(Clone)]
pub struct DigitransitClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl DigitransitClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }

    /// Available bicycles at Pohjolankatu and Koskelantie.
    pub async fn bike_counts(&self) -> Result<BikeCounts, SourceError> {
        let body = serde_json::json!({ "query": BIKE_COUNTS_QUERY });
        let data: BikeStationsData = self.post(&body, BIKE_QUERY_TIMEOUT).await?.ok_or_else(
            || SourceError::Decode("GraphQL response has no data".to_string()),
        )?;

        Ok(BikeCounts {
            pohjolankatu: data
                .pohjolankatu
                .unwrap_or_default()
                .into_station("Pohjolankatu"),
            koskelantie: data
                .koskelantie
                .unwrap_or_default()
                .into_station("Koskelantie"),
        })
    }

    /// Upcoming departures for a stop, as seconds since midnight.
    pub async fn departures(&self, query: &DepartureQuery<'_>) -> Result<Vec<u32>, SourceError> {
        let body = serde_json::json!({
            "query": STOP_TIMES_QUERY,
            "variables": { "stopId": query.stop_id },
        });

        let stop = self
            .post::<StopData>(&body, REQUEST_TIMEOUT)
            .await?
            .and_then(|d| d.stop)
            .ok_or_else(|| SourceError::NotFound(format!("stop {}", query.stop_id)))?;

        Ok(select_departures(&stop, query))
    }

    /// POST a GraphQL request and return its `data`.
    async fn post<T: DeserializeOwned>(
        &self,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<Option<T>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::NotConfigured("DIGITRANSIT_KEY"))?;

        let response = self
            .http
            .post(&self.url)
            .header("digitransit-subscription-key", api_key)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Digitransit rejected the subscription key (401)");
            return Err(SourceError::Unauthorized("Digitransit"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        if let Some(errors) = payload.errors {
            return Err(SourceError::GraphQl(errors.to_string()));
        }

        Ok(payload.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_from(json: serde_json::Value) -> Stop {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_bicycles_only_counts_bicycle_form_factor() {
        let station: RentalStation = serde_json::from_value(serde_json::json!({
            "name": "Pohjolankatu",
            "availableVehicles": {
                "byType": [
                    {"count": 3, "vehicleType": {"formFactor": "BICYCLE"}},
                    {"count": 2, "vehicleType": {"formFactor": "SCOOTER"}},
                    {"count": 1, "vehicleType": {"formFactor": "BICYCLE"}},
                    {"count": null, "vehicleType": {"formFactor": "BICYCLE"}},
                    {"count": 5, "vehicleType": null}
                ]
            }
        }))
        .unwrap();

        assert_eq!(station.bicycles(), 4);
    }

    #[test]
    fn test_bicycles_saturates_on_huge_counts() {
        let station: RentalStation = serde_json::from_value(serde_json::json!({
            "availableVehicles": {
                "byType": [
                    {"count": 4294967295u32, "vehicleType": {"formFactor": "BICYCLE"}},
                    {"count": 10, "vehicleType": {"formFactor": "BICYCLE"}}
                ]
            }
        }))
        .unwrap();

        assert_eq!(station.bicycles(), u32::MAX);
    }

    #[test]
    fn test_missing_station_falls_back_to_default_name() {
        let station = RentalStation::default().into_station("Koskelantie");
        assert_eq!(
            station,
            StationBikes {
                name: "Koskelantie".to_string(),
                bikes: 0
            }
        );
    }

    #[test]
    fn test_select_departures_route_prefix_and_limit() {
        let stop = stop_from(serde_json::json!({
            "stoptimesWithoutPatterns": [
                {"scheduledDeparture": 57000, "realtimeDeparture": 57300,
                 "trip": {"route": {"shortName": "1T"}, "tripHeadsign": "Eira"}},
                {"scheduledDeparture": 57400, "realtimeDeparture": null,
                 "trip": {"route": {"shortName": "7"}, "tripHeadsign": "Länsiterminaali"}},
                {"scheduledDeparture": 57600, "realtimeDeparture": 57660,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}},
                {"scheduledDeparture": null, "realtimeDeparture": null,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}},
                {"scheduledDeparture": 58200,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}},
                {"scheduledDeparture": 59000,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}}
            ]
        }));

        assert_eq!(
            select_departures(&stop, &TRAM_1_TO_EIRA),
            vec![57300, 57660, 58200]
        );
    }

    #[test]
    fn test_zero_realtime_departure_uses_schedule() {
        let stop = stop_from(serde_json::json!({
            "stoptimesWithoutPatterns": [
                {"scheduledDeparture": 86460, "realtimeDeparture": 0,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}},
                {"scheduledDeparture": 0, "realtimeDeparture": 0,
                 "trip": {"route": {"shortName": "1"}, "tripHeadsign": "Eira"}}
            ]
        }));

        assert_eq!(select_departures(&stop, &TRAM_1_TO_EIRA), vec![86460, 0]);
    }

    #[test]
    fn test_select_departures_headsign_case_insensitive() {
        let stop = stop_from(serde_json::json!({
            "stoptimesWithoutPatterns": [
                {"scheduledDeparture": 60000,
                 "trip": {"route": {"shortName": "66"}, "tripHeadsign": "Kalasatama"}},
                {"scheduledDeparture": 60600,
                 "trip": {"route": {"shortName": "66"}, "tripHeadsign": "PALOHEINÄ"}},
                {"scheduledDeparture": 61200,
                 "trip": {"route": {"shortName": "66K"}, "tripHeadsign": "Paloheinä via Käpylä"}},
                {"scheduledDeparture": 61800, "trip": null}
            ]
        }));

        assert_eq!(
            select_departures(&stop, &BUS_66_TO_PALOHEINA),
            vec![60600, 61200]
        );
    }
}
