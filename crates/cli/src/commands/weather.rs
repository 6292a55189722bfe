//! `wardrobe weather` — Current conditions and the stylist's weather report.

use wardrobe_core::weather::Location;
use wardrobe_weather::weather_report;

pub async fn run(lat: Option<f64>, lon: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(false)?;

    let location = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Location::new(lat, lon, format!("{lat:.2}, {lon:.2}"))),
        _ => None,
    };

    let snapshot = service.weather_at(location.as_ref()).await?;
    println!("{}", weather_report(&snapshot));
    Ok(())
}
