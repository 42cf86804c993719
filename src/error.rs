//! Crate-wide error type.

use thiserror::Error;

/// Errors raised by the admin client.
///
/// Network-class failures (`Unreachable`, `Timeout`, `Http`) are never fatal:
/// callers fall back to sample data or optimistic local state.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure other than a timeout, a refused connection or a
    /// body that failed to decode.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("request to {0} timed out")]
    Timeout(String),

    /// Connection refused, DNS failure or no route to host.
    #[error("backend unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend responded with HTTP {0}")]
    Status(u16),

    /// Backend answered 2xx with a body that does not fit the models.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered but reported `success: false`.
    #[error("{message}")]
    Api { message: String },

    /// Token rejected by the backend (invalid or expired).
    #[error("not authorized, login again")]
    Unauthorized,

    #[error("no backend reachable")]
    NoBackendReachable,

    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("store error: {0}")]
    Store(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl Error {
    /// True for failures where the backend could not be talked to at all.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Timeout(_) | Error::Unreachable { .. }
        )
    }

    /// Token rejected, either by HTTP status or by the backend's
    /// "Not Authorized" envelope.
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Unauthorized => true,
            Error::Api { message } => message.to_lowercase().contains("not authorized"),
            _ => false,
        }
    }

    /// Application-level rejection with a backend-provided message.
    pub fn api(message: Option<String>, fallback: &str) -> Self {
        Error::Api {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        if e.is_timeout() {
            Error::Timeout(url)
        } else if e.is_decode() {
            Error::Decode { url, source: e }
        } else if e.is_connect() {
            Error::Unreachable { url, source: e }
        } else {
            Error::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_uses_fallback_for_blank_message() {
        let e = Error::api(Some("  ".to_string()), "Failed to load products");
        assert_eq!(e.to_string(), "Failed to load products");

        let e = Error::api(Some("Not Authorized".to_string()), "ignored");
        assert_eq!(e.to_string(), "Not Authorized");
    }

    #[test]
    fn classification() {
        assert!(Error::Timeout("http://a".into()).is_network());
        assert!(!Error::Unauthorized.is_network());
        assert!(!Error::Status(500).is_network());
        assert!(!Error::api(None, "x").is_network());
        assert!(Error::api(Some("Not Authorized Login Again".into()), "x").is_auth());
        assert!(Error::Unauthorized.is_auth());
        assert!(!Error::NoBackendReachable.is_auth());
    }
}
