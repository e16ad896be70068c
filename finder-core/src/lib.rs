//! Core library for `weather-finder`.
//!
//! This crate defines:
//! - An HTTP transport to the OpenWeatherMap host
//! - A weather client for location search and current conditions
//! - Shared domain models and the error taxonomy
//!
//! It is used by `weather-finder-cli`, but any front end can own a
//! [`WeatherClient`] per session and call it directly.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;

pub use client::{SEARCH_LIMIT, WeatherClient};
pub use config::Config;
pub use error::{ClientError, TransportError};
pub use model::{ApiKey, Location, WeatherReading};
pub use transport::{DEFAULT_BASE_URL, HttpTransport, Transport};
