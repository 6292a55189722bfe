//! Weather for the wardrobe assistant.
//!
//! [`OpenMeteoClient`] fetches current conditions (no API key needed);
//! [`condition_label`] maps WMO weather codes to short labels; and
//! [`weather_report`] renders the short report shown to users and embedded
//! in chat context.

pub mod open_meteo;
pub mod report;

pub use open_meteo::OpenMeteoClient;
pub use report::{condition_label, weather_report};
