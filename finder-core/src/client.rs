use tracing::{instrument, warn};
use urlencoding::encode;

use crate::{
    Config,
    error::{ClientError, TransportError},
    model::{ApiKey, Location, WeatherReading},
    transport::{HttpTransport, Transport},
};

mod response;

use response::{OwCurrentResponse, OwGeoItem};

/// Maximum number of matches requested from the geocoding endpoint.
pub const SEARCH_LIMIT: u32 = 5;

/// Stateful facade over a [`Transport`] that owns the API key.
///
/// One instance per session. Both lookups take `&self` and run independently
/// when issued concurrently; replacing the key needs `&mut self`.
#[derive(Debug)]
pub struct WeatherClient<T = HttpTransport> {
    transport: T,
    api_key: Option<ApiKey>,
}

impl WeatherClient<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Ok(Self::with_transport(HttpTransport::from_config(config)?))
    }
}

impl<T: Transport> WeatherClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            api_key: None,
        }
    }

    /// Replace the stored key. An empty key clears it.
    pub fn set_credential(&mut self, key: impl Into<String>) {
        self.api_key = ApiKey::new(key);
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Search up to [`SEARCH_LIMIT`] places matching `query`, in provider order.
    #[instrument(skip(self), level = "info")]
    pub async fn search_locations(&self, query: &str) -> Result<Vec<Location>, ClientError> {
        let key = self.credential()?;
        let path = format!(
            "/geo/1.0/direct?q={}&limit={SEARCH_LIMIT}&appid={}",
            encode(query),
            encode(key.expose()),
        );

        self.fetch_locations(&path).await.map_err(|err| {
            warn!(error = %err, "location search failed");
            ClientError::SearchFailed(Box::new(err))
        })
    }

    /// Current conditions for `location`, in metric units.
    #[instrument(skip(self, location), fields(location = %location), level = "info")]
    pub async fn get_current_weather(
        &self,
        location: &Location,
    ) -> Result<WeatherReading, ClientError> {
        let key = self.credential()?;
        let path = format!(
            "/data/2.5/weather?lat={}&lon={}&units=metric&appid={}",
            location.lat,
            location.lon,
            encode(key.expose()),
        );

        self.fetch_current(&path, location).await.inspect_err(|err| {
            warn!(error = %err, "weather lookup failed");
        })
    }

    /// Snapshot of the key taken at call start.
    fn credential(&self) -> Result<ApiKey, ClientError> {
        self.api_key.clone().ok_or(ClientError::MissingCredential)
    }

    async fn fetch_locations(&self, path: &str) -> Result<Vec<Location>, ClientError> {
        let value = self.transport.get(path).await.map_err(ClientError::from_transport)?;

        let items: Vec<OwGeoItem> = serde_json::from_value(value)
            .map_err(|e| ClientError::MalformedPayload(format!("geocoding response: {e}")))?;

        Ok(items.into_iter().map(Location::from).collect())
    }

    async fn fetch_current(
        &self,
        path: &str,
        location: &Location,
    ) -> Result<WeatherReading, ClientError> {
        let value = self.transport.get(path).await.map_err(ClientError::from_transport)?;

        OwCurrentResponse::from_value(value)?.into_reading(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Canned {
        Json(Value),
        Status(u16),
        NotJson,
    }

    /// Fake transport that records requested paths and replays one answer.
    #[derive(Debug)]
    struct FakeTransport {
        answer: Canned,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn new(answer: Canned) -> Self {
            Self {
                answer,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, path_and_query: &str) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push(path_and_query.to_string());

            match &self.answer {
                Canned::Json(v) => Ok(v.clone()),
                Canned::Status(code) => Err(TransportError::Status {
                    status: *code,
                    body: String::new(),
                }),
                Canned::NotJson => Err(TransportError::Decode(
                    serde_json::from_str::<Value>("<html>").unwrap_err(),
                )),
            }
        }
    }

    fn client(answer: Canned) -> WeatherClient<FakeTransport> {
        let mut client = WeatherClient::with_transport(FakeTransport::new(answer));
        client.set_credential("KEY");
        client
    }

    fn paris() -> Location {
        Location {
            name: "Paris".into(),
            country: "FR".into(),
            state: String::new(),
            lat: 48.8566,
            lon: 2.3522,
        }
    }

    fn paris_weather() -> Value {
        json!({
            "coord": {"lon": 2.35, "lat": 48.86},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 21.7, "feels_like": 21.2, "humidity": 64},
            "visibility": 8500,
            "wind": {"speed": 5.0, "deg": 240},
            "dt": 1_700_000_000,
            "name": "Paris 1er Arrondissement"
        })
    }

    #[tokio::test]
    async fn missing_credential_makes_no_request() {
        let client = WeatherClient::with_transport(FakeTransport::new(Canned::Json(json!([]))));

        let err = client.search_locations("Paris").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential));

        let err = client.get_current_weather(&paris()).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential));

        assert!(client.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_credential_counts_as_missing() {
        let mut client = client(Canned::Json(json!([])));
        client.set_credential("");

        assert!(!client.has_credential());
        let err = client.search_locations("Paris").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential));
    }

    #[tokio::test]
    async fn replaced_credential_is_used_for_next_call() {
        let mut client = client(Canned::Json(json!([])));
        client.set_credential("NEW");

        client.search_locations("Oslo").await.unwrap();

        let calls = client.transport.calls();
        assert!(calls[0].ends_with("&appid=NEW"));
    }

    #[tokio::test]
    async fn search_builds_encoded_path() {
        let client = client(Canned::Json(json!([])));

        client.search_locations("San José, CR").await.unwrap();

        assert_eq!(
            client.transport.calls(),
            vec!["/geo/1.0/direct?q=San%20Jos%C3%A9%2C%20CR&limit=5&appid=KEY".to_string()]
        );
    }

    #[tokio::test]
    async fn search_preserves_order_and_defaults_state() {
        let client = client(Canned::Json(json!([
            {"name": "Springfield", "country": "US", "state": "Illinois",
             "lat": 39.8, "lon": -89.6},
            {"name": "Springfield", "country": "US", "state": "Missouri",
             "lat": 37.2, "lon": -93.3},
            {"name": "Springfield", "country": "AU", "lat": -33.9, "lon": 150.9,
             "local_names": {"en": "Springfield"}}
        ])));

        let locations = client.search_locations("Springfield").await.unwrap();

        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].state, "Illinois");
        assert_eq!(locations[1].state, "Missouri");
        assert_eq!(locations[2].country, "AU");
        assert_eq!(locations[2].state, "");
    }

    #[tokio::test]
    async fn search_failure_wraps_classified_cause() {
        let client = client(Canned::Status(401));

        let err = client.search_locations("Paris").await.unwrap_err();

        match err {
            ClientError::SearchFailed(inner) => {
                assert!(matches!(*inner, ClientError::Unauthorized));
            }
            other => panic!("expected SearchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_with_unexpected_shape_fails() {
        let client = client(Canned::Json(json!({"cod": "400", "message": "Nothing to geocode"})));

        let err = client.search_locations("Paris").await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::SearchFailed(inner) if matches!(*inner, ClientError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn weather_builds_metric_path() {
        let client = client(Canned::Json(paris_weather()));

        client.get_current_weather(&paris()).await.unwrap();

        assert_eq!(
            client.transport.calls(),
            vec!["/data/2.5/weather?lat=48.8566&lon=2.3522&units=metric&appid=KEY".to_string()]
        );
    }

    #[tokio::test]
    async fn weather_reading_converts_and_keeps_location() {
        let client = client(Canned::Json(paris_weather()));
        let location = paris();

        let reading = client.get_current_weather(&location).await.unwrap();

        assert_eq!(reading.location, location);
        assert_eq!(reading.location.name, "Paris");
        assert_eq!(reading.temperature, 22);
        assert_eq!(reading.wind_speed, 18);
        assert_eq!(reading.visibility, 9);
        assert_eq!(reading.humidity, 64);
        assert_eq!(reading.icon, "10d");
    }

    #[tokio::test]
    async fn missing_weather_or_main_is_invalid_data() {
        let mut without_weather = paris_weather();
        without_weather.as_object_mut().unwrap().remove("weather");
        let mut without_main = paris_weather();
        without_main.as_object_mut().unwrap().remove("main");

        for body in [without_weather, without_main, json!([])] {
            let client = client(Canned::Json(body));
            let err = client.get_current_weather(&paris()).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidData(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn missing_wind_is_malformed_payload() {
        let mut body = paris_weather();
        body.as_object_mut().unwrap().remove("wind");
        let client = client(Canned::Json(body));

        let err = client.get_current_weather(&paris()).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn weather_status_codes_are_classified() {
        let cases: [(u16, fn(&ClientError) -> bool); 5] = [
            (401, |e| matches!(e, ClientError::Unauthorized)),
            (404, |e| matches!(e, ClientError::NotFound)),
            (429, |e| matches!(e, ClientError::RateLimited)),
            (500, |e| matches!(e, ClientError::ProviderUnavailable { status: 500 })),
            (418, |e| matches!(e, ClientError::LookupFailed(_))),
        ];

        for (status, check) in cases {
            let client = client(Canned::Status(status));
            let err = client.get_current_weather(&paris()).await.unwrap_err();
            assert!(check(&err), "status {status} classified as {err:?}");
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed_payload() {
        let client = client(Canned::NotJson);

        let err = client.get_current_weather(&paris()).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedPayload(_)));
    }
}
