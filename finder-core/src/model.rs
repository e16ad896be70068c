use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Provider API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for an empty key, which counts as no credential at all.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        (!key.is_empty()).then_some(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// A geocoded place returned by location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    /// Region or state; empty when the provider does not report one.
    #[serde(default)]
    pub state: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Human-readable label, e.g. "Portland, Oregon, US" or "Paris, FR".
    pub fn label(&self) -> String {
        if self.state.is_empty() {
            format!("{}, {}", self.name, self.country)
        } else {
            format!("{}, {}, {}", self.name, self.state, self.country)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Current conditions for a [`Location`], in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub location: Location,
    /// Degrees Celsius.
    pub temperature: i32,
    pub description: String,
    /// Percent.
    pub humidity: i32,
    /// km/h.
    pub wind_speed: i32,
    /// km.
    pub visibility: i32,
    /// Provider icon code, e.g. "04d".
    pub icon: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherReading {
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon)
    }
}
