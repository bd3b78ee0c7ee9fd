// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Display formatting for dashboard values.

/// Format a sleep duration as `"H h M min"`. Minutes are truncated.
pub fn format_sleep(seconds: u64) -> String {
    format!("{} h {} min", seconds / 3600, (seconds % 3600) / 60)
}

/// Format a weight in kilograms with a decimal comma, e.g. `"88,5 kg"`.
///
/// Whole numbers keep one decimal (`"88,0 kg"`); other values keep their
/// shortest exact representation.
pub fn format_weight(kg: f64) -> String {
    let number = if kg.fract() == 0.0 {
        format!("{:.1}", kg)
    } else {
        kg.to_string()
    };
    format!("{} kg", number.replace('.', ","))
}

/// Format seconds since midnight as a zero-padded `"HH:MM"` clock time.
///
/// Transit feeds count past midnight (e.g. 90000 for 01:00 the next day), so
/// hours wrap at 24.
pub fn format_clock(seconds_since_midnight: u32) -> String {
    let hours = (seconds_since_midnight / 3600) % 24;
    let minutes = (seconds_since_midnight % 3600) / 60;
    format!("{:02}:{:02}", hours, minutes)
}

/// Join departure times into `"HH:MM, HH:MM"`.
pub fn format_departures(departures: &[u32]) -> String {
    departures
        .iter()
        .map(|&secs| format_clock(secs))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert meters to kilometers rounded to one decimal.
///
/// Rounds the exact binary value, so 2050 m is 2.0 km (2.05 is stored as
/// 2.04999...).
pub fn meters_to_km(meters: f64) -> f64 {
    format!("{:.1}", meters / 1000.0).parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sleep() {
        assert_eq!(format_sleep(26722), "7 h 25 min");
        assert_eq!(format_sleep(0), "0 h 0 min");
        assert_eq!(format_sleep(3599), "0 h 59 min");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(88.5), "88,5 kg");
        assert_eq!(format_weight(88.0), "88,0 kg");
        assert_eq!(format_weight(72.35), "72,35 kg");
        assert_eq!(format_weight(0.0), "0,0 kg");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(57300), "15:55");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(90060), "01:01");
    }

    #[test]
    fn test_format_departures() {
        assert_eq!(format_departures(&[57300, 58260]), "15:55, 16:11");
        assert_eq!(format_departures(&[]), "");
    }

    #[test]
    fn test_meters_to_km() {
        assert_eq!(meters_to_km(12345.0), 12.3);
        assert_eq!(meters_to_km(12350.0), 12.3);
        assert_eq!(meters_to_km(2050.0), 2.0);
        assert_eq!(meters_to_km(250.0), 0.2);
        assert_eq!(meters_to_km(20450.5), 20.5);
        assert_eq!(meters_to_km(0.0), 0.0);
    }
}
