//! Wire shapes of the OpenWeatherMap geocoding and current-weather endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ClientError,
    model::{Location, WeatherReading},
};

/// One entry of `/geo/1.0/direct`.
#[derive(Debug, Deserialize)]
pub(crate) struct OwGeoItem {
    name: String,
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

impl From<OwGeoItem> for Location {
    fn from(item: OwGeoItem) -> Self {
        Self {
            name: item.name,
            country: item.country,
            state: item.state.unwrap_or_default(),
            lat: item.lat,
            lon: item.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

/// `/data/2.5/weather`.
#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrentResponse {
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    visibility: f64,
    dt: Option<i64>,
}

impl OwCurrentResponse {
    /// Check the weather list and main block before decoding the rest, so
    /// their absence is reported as invalid data rather than a decode error.
    pub(crate) fn from_value(value: Value) -> Result<Self, ClientError> {
        let has_main = value
            .get("main")
            .and_then(Value::as_object)
            .is_some_and(|main| !main.is_empty());
        if !has_main {
            return Err(ClientError::InvalidData("response has no main block".into()));
        }

        let has_weather = value
            .get("weather")
            .and_then(Value::as_array)
            .is_some_and(|weather| !weather.is_empty());
        if !has_weather {
            return Err(ClientError::InvalidData("response has no weather conditions".into()));
        }

        serde_json::from_value(value)
            .map_err(|e| ClientError::MalformedPayload(format!("weather response: {e}")))
    }

    /// Build a reading for `location`, which is carried through unchanged.
    pub(crate) fn into_reading(self, location: &Location) -> Result<WeatherReading, ClientError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidData("response has no weather conditions".into()))?;

        Ok(WeatherReading {
            location: location.clone(),
            temperature: round(self.main.temp),
            description: condition.description,
            humidity: round(self.main.humidity),
            wind_speed: round(mps_to_kmh(self.wind.speed)),
            visibility: round(self.visibility / 1000.0),
            icon: condition.icon,
            observed_at: self.dt.and_then(unix_to_utc),
        })
    }
}

fn mps_to_kmh(speed: f64) -> f64 {
    speed * 3.6
}

/// Halves round up toward positive infinity, so -0.5 becomes 0.
fn round(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}
