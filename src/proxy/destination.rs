//! Destination descriptor decoded from the forwarded-URL header.

use axum::http::uri::{InvalidUri, PathAndQuery};
use axum::http::{HeaderValue, Uri};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("destination header {0} is missing")]
    Missing(String),

    #[error("destination header is not valid UTF-8")]
    NotUtf8,

    #[error("destination {value:?} is not a URL: {reason}")]
    Unparsable { value: String, reason: String },

    #[error("destination {0:?} has no host")]
    NoHost(String),

    #[error("destination scheme {0:?} is not http or https")]
    UnsupportedScheme(String),
}

/// Where the request must actually go.
///
/// `url` only vets the scheme and host. The request target is the header's
/// own authority, path and query, byte for byte: no dot-segment resolution,
/// no re-encoding. Percent-escapes are left for the backend to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    uri: Uri,
}

impl Destination {
    /// Decode a raw header value.
    pub fn parse(raw: &HeaderValue) -> Result<Self, DestinationError> {
        let value = raw.to_str().map_err(|_| DestinationError::NotUtf8)?.trim();
        Self::parse_str(value)
    }

    pub fn parse_str(value: &str) -> Result<Self, DestinationError> {
        let unparsable = |reason: String| DestinationError::Unparsable {
            value: value.to_string(),
            reason,
        };

        let url = Url::parse(value).map_err(|e| unparsable(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(DestinationError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(DestinationError::NoHost(value.to_string()));
        }

        let raw = value
            .parse::<Uri>()
            .map_err(|e: InvalidUri| unparsable(e.to_string()))?;

        // Userinfo never reaches the Host header; the port stays as written.
        let authority = raw
            .authority()
            .map(|a| a.as_str().rsplit_once('@').map_or(a.as_str(), |(_, host)| host))
            .filter(|a| !a.is_empty())
            .ok_or_else(|| DestinationError::NoHost(value.to_string()))?;

        let target = match raw.path_and_query().map(PathAndQuery::as_str) {
            Some(target) if target.starts_with('/') => target.to_string(),
            Some(target) => format!("/{target}"),
            None => "/".to_string(),
        };

        let uri = Uri::builder()
            .scheme(url.scheme())
            .authority(authority)
            .path_and_query(target)
            .build()
            .map_err(|e| unparsable(e.to_string()))?;
        Ok(Self { uri })
    }

    /// Absolute request target for the outbound leg.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// `host[:port]` exactly as the header spelled it.
    pub fn authority(&self) -> &str {
        self.uri.authority().map_or("", |a| a.as_str())
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        HeaderValue::from_str(self.authority())
    }
}
