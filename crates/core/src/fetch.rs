//! HTTP retrieval of styles, sprites and glyph ranges.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use reqwest::{blocking::Client, header::AUTHORIZATION};

use crate::{Auth, FetchError};

/// Something that can GET a URL. Implemented over HTTP by [`HttpFetcher`];
/// tests substitute an in-memory table.
pub trait Fetch: Sync {
    fn fetch(&self, url: &str, auth: Option<&Auth>) -> Result<Vec<u8>, FetchError>;
}

/// `Authorization` header value for HTTP basic auth.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Blocking HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, auth: Option<&Auth>) -> Result<Vec<u8>, FetchError> {
        let mut request = self.client.get(url);
        if let Some((username, password)) = auth.and_then(Auth::credentials) {
            debug!("Using basic auth for {url}");
            request = request.header(AUTHORIZATION, basic_auth_header(username, password));
        }

        let response = request
            .send()
            .map_err(|source| FetchError::Request { url: url.to_owned(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_owned(), status: status.as_u16() });
        }

        let bytes = response
            .bytes()
            .map_err(|source| FetchError::Request { url: url.to_owned(), source })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth_header("user", "pass"), "Basic dXNlcjpwYXNz");
    }
}
