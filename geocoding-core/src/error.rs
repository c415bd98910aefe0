use thiserror::Error;

/// Coarse classification of a [`GeocodeError`], used by front ends to pick a
/// status code without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Upstream,
    Timeout,
    Parse,
}

/// Failure of a single geocoding request.
///
/// Every variant is recoverable: the router turns them into a
/// `success: false` envelope and keeps serving.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid platform specified: '{0}'.")]
    UnknownProvider(String),

    #[error("Default geocoder '{0}' is not configured.")]
    DefaultUnavailable(String),

    #[error("No geocoders are configured.")]
    NoProviders,

    #[error("No address found for the given input.")]
    NoResults,

    #[error("HTTP error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("API rate limit exceeded.")]
    RateLimited,

    #[error("Request timeout.")]
    Timeout,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response format: {0}")]
    Parse(String),
}

impl GeocodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeocodeError::Validation(_) => ErrorKind::Validation,
            GeocodeError::UnknownProvider(_)
            | GeocodeError::DefaultUnavailable(_)
            | GeocodeError::NoProviders
            | GeocodeError::NoResults => ErrorKind::NotFound,
            GeocodeError::Upstream { .. }
            | GeocodeError::RateLimited
            | GeocodeError::Transport(_) => ErrorKind::Upstream,
            GeocodeError::Timeout => ErrorKind::Timeout,
            GeocodeError::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else if err.is_decode() {
            GeocodeError::Parse(err.to_string())
        } else {
            GeocodeError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(err: serde_json::Error) -> Self {
        GeocodeError::Parse(err.to_string())
    }
}
