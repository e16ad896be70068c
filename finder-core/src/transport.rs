use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};
use tracing::debug;

use crate::{Config, error::TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// One outbound GET per call against a fixed provider host.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// `path_and_query` is appended verbatim to the base host.
    async fn get(&self, path_and_query: &str) -> Result<serde_json::Value, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the transport at another host, e.g. a mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Build a transport honoring the optional base URL and timeout in `config`.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path_and_query: &str) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(path = %redact_credential(path_and_query), "GET provider");

        let res = self.http.get(&url).send().await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(status = status.as_u16(), "provider responded");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(TransportError::Decode)
    }
}

/// Mask the `appid` query value so paths can be logged.
pub(crate) fn redact_credential(path_and_query: &str) -> String {
    let Some((path, query)) = path_and_query.split_once('?') else {
        return path_and_query.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("appid", _)) => "appid=***",
            _ => pair,
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{path}?{query}")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
