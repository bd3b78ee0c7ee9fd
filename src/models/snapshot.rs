//! Response shapes served to the dashboard and the LaMetric device.

use serde::Serialize;

/// One flattened aggregation of every source, built per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub biked_km: f64,
    pub pohjolankatu_alepabikes: u32,
    pub koskelantie_alepabikes: u32,
    pub steps: u64,
    pub activity_percentage: u32,
    pub readiness: u32,
    pub sleep_time: String,
    pub sleep_score: u32,
    pub calories_consumed: u64,
    pub weight: String,
    pub tram_1_to_eira: String,
    pub bus_66_to_paloheina_ice_rink: String,
    pub kapyla_ice: String,
    pub kapyla_ice_rink: String,
    pub ogeli_ice: String,
}

/// Available bicycles at a rental station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationBikes {
    pub name: String,
    pub bikes: u32,
}

/// Bike counts for the two watched rental stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BikeCounts {
    pub pohjolankatu: StationBikes,
    pub koskelantie: StationBikes,
}

/// LaMetric "My Data DIY" frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaMetricFrame {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaMetricFrames {
    pub frames: Vec<LaMetricFrame>,
}

impl LaMetricFrames {
    /// One frame per station, in display order.
    pub fn for_bikes(counts: &BikeCounts, icon: &str) -> Self {
        let frame = |station: &StationBikes| LaMetricFrame {
            text: format!("{}: {} 🚲", station.name, station.bikes),
            icon: icon.to_string(),
        };

        Self {
            frames: vec![frame(&counts.pohjolankatu), frame(&counts.koskelantie)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lametric_frames_for_bikes() {
        let counts = BikeCounts {
            pohjolankatu: StationBikes {
                name: "Pohjolankatu".to_string(),
                bikes: 4,
            },
            koskelantie: StationBikes {
                name: "Koskelantie".to_string(),
                bikes: 0,
            },
        };

        let frames = LaMetricFrames::for_bikes(&counts, "i1234");
        let json = serde_json::to_value(&frames).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "frames": [
                    {"text": "Pohjolankatu: 4 🚲", "icon": "i1234"},
                    {"text": "Koskelantie: 0 🚲", "icon": "i1234"},
                ]
            })
        );
    }
}
