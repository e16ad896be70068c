//! Error types for the transport and the weather client.

use thiserror::Error;

/// Failure of a single HTTP GET against the provider.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The provider answered with a non-2xx status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body of a successful response was not valid JSON.
    #[error("failed to decode provider response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request never produced a response (connect, DNS, timeout, ...).
    #[error("request to provider failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl TransportError {
    /// HTTP status code, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced to the presentation layer.
///
/// `Display` is the diagnostic form; [`ClientError::user_message`] is what a UI
/// should render.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no API key has been set")]
    MissingCredential,

    /// Location search failed; the inner error is the classified cause.
    #[error("location search failed: {0}")]
    SearchFailed(#[source] Box<ClientError>),

    /// The response was well-formed JSON but lacked the weather or main block.
    #[error("invalid weather data: {0}")]
    InvalidData(String),

    #[error("provider rejected the API key (HTTP 401)")]
    Unauthorized,

    #[error("provider has no data for this location (HTTP 404)")]
    NotFound,

    #[error("provider rate limit exceeded (HTTP 429)")]
    RateLimited,

    /// Any 5xx answer, not only 500.
    #[error("provider is unavailable (HTTP {status})")]
    ProviderUnavailable { status: u16 },

    #[error("network error: {0}")]
    NetworkError(#[source] TransportError),

    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    /// Anything not covered above; keeps the transport cause.
    #[error("weather lookup failed: {0}")]
    LookupFailed(#[source] TransportError),
}

impl ClientError {
    /// Classify a transport failure into a client category.
    pub fn from_transport(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401, .. } => Self::Unauthorized,
            TransportError::Status { status: 404, .. } => Self::NotFound,
            TransportError::Status { status: 429, .. } => Self::RateLimited,
            TransportError::Status { status, .. } if (500..600).contains(&status) => {
                Self::ProviderUnavailable { status }
            }
            TransportError::Decode(e) => Self::MalformedPayload(e.to_string()),
            err @ TransportError::Request(_) => Self::NetworkError(err),
            err => Self::LookupFailed(err),
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => {
                "API key is required. Please enter your OpenWeatherMap API key.".to_string()
            }
            Self::SearchFailed(inner) => {
                format!("Failed to search locations. {}", inner.user_message())
            }
            Self::InvalidData(_) => {
                "Weather data for this location is incomplete. Please try another location."
                    .to_string()
            }
            Self::Unauthorized => {
                "Invalid API key. Please check your OpenWeatherMap API key.".to_string()
            }
            Self::NotFound => "Weather data not found for this location.".to_string(),
            Self::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            Self::ProviderUnavailable { .. } => {
                "The weather service is having problems. Please try again later.".to_string()
            }
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
            Self::MalformedPayload(_) => {
                "The weather service sent a response that could not be read.".to_string()
            }
            Self::LookupFailed(e) => format!("Failed to get weather data: {e}"),
        }
    }
}
