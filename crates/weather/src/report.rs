//! Weather-code labels and the human-readable weather report.

use wardrobe_core::weather::WeatherSnapshot;

/// Below this temperature (°C) the report suggests outerwear.
pub const OUTERWEAR_BELOW_C: f64 = 15.0;

/// Label used for codes missing from the table.
pub const FALLBACK_CONDITION: &str = "cloudy";

/// Map a WMO weather interpretation code to a short label.
pub fn condition_label(code: u16) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 => "fog",
        48 => "depositing rime fog",
        51 => "light drizzle",
        53 => "drizzle",
        55 => "dense drizzle",
        56 | 57 => "freezing drizzle",
        61 => "light rain",
        63 => "rain",
        65 => "heavy rain",
        66 | 67 => "freezing rain",
        71 => "light snow",
        73 => "snow",
        75 => "heavy snow",
        77 => "snow grains",
        80 => "light showers",
        81 => "showers",
        82 => "violent showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => FALLBACK_CONDITION,
    }
}

/// Short report: conditions, humidity and wind when known, and a layering hint.
pub fn weather_report(snapshot: &WeatherSnapshot) -> String {
    let location = fallback(&snapshot.location_label, "your location");
    let condition = fallback(&snapshot.condition, "unknown conditions");
    let mut report = format!(
        "Weather in {location}: {}°C, {condition}.",
        snapshot.temperature
    );

    match (snapshot.humidity_pct, snapshot.wind_speed_kmh) {
        (Some(humidity), Some(wind)) => {
            report.push_str(&format!(" Humidity {humidity}%, wind {wind} km/h."))
        }
        (Some(humidity), None) => report.push_str(&format!(" Humidity {humidity}%.")),
        (None, Some(wind)) => report.push_str(&format!(" Wind {wind} km/h.")),
        (None, None) => {}
    }

    if snapshot.temperature < OUTERWEAR_BELOW_C {
        report.push_str(" It is cool, so add a layer of outerwear.");
    } else {
        report.push_str(" Mild temperatures suit a light outfit.");
    }
    report
}

fn fallback<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { default } else { trimmed }
}
