//! HTTP transport seam for the host-does-IO pattern.
//!
//! # Design
//! The client builds an `HttpRequest` and interprets an `HttpResponse`; the
//! network round-trip in between belongs to a `Transport`. `UreqTransport` is
//! the default blocking implementation. Tests and embedders can supply their
//! own transport, or skip it entirely and drive `MwsClient::build_call` /
//! `MwsClient::parse_response` themselves.
//!
//! There is no pooling, caching or retrying: every `get` is one fresh request.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::TransportError;

/// A GET request to MWS described as plain data.
///
/// The URL query carries the session token, so `Debug` prints only the
/// endpoint and the parameter names.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Value of query parameter `key`, percent-decoded.
    pub fn query_value(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut endpoint = self.url.clone();
        endpoint.set_query(None);
        let keys: Vec<String> = self.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        f.debug_struct("HttpRequest")
            .field("endpoint", &endpoint.as_str())
            .field("query_keys", &keys)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A completed HTTP exchange: status code and raw body.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Executes a single GET request within `request.timeout`.
///
/// Any status code is a successful transport result; only connection,
/// timeout and body-read failures are `TransportError`s.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).get(request)
    }
}

/// Largest response body `UreqTransport` reads by default: 64 MiB.
pub const DEFAULT_BODY_LIMIT: u64 = 64 * 1024 * 1024;

/// Blocking transport built on `ureq`, one agent per request.
///
/// Bodies are read up to `body_limit` bytes ([`DEFAULT_BODY_LIMIT`] unless
/// set with `with_body_limit`). A longer body fails the request with a
/// `TransportError` instead of being truncated.
#[derive(Debug, Clone, Copy)]
pub struct UreqTransport {
    body_limit: u64,
}

impl UreqTransport {
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        // Status codes are returned as data so the client can classify them.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .build()
            .new_agent();

        let mut response = agent
            .get(request.url.as_str())
            .call()
            .map_err(|e| TransportError::with_source("request to MWS failed", e))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()
            .map_err(|e| TransportError::with_source("could not read MWS response body", e))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest {
            url: Url::parse("https://mws.example:8800/?Library=Data&SessionToken=alice%3Bhunter2")
                .unwrap(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn request_debug_hides_query_values() {
        let debug = format!("{:?}", request());
        assert!(debug.contains("https://mws.example:8800/"));
        assert!(debug.contains("SessionToken"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn query_value_is_decoded() {
        assert_eq!(request().query_value("SessionToken").as_deref(), Some("alice;hunter2"));
        assert_eq!(request().query_value("Missing"), None);
    }

    #[test]
    fn ureq_transport_body_limit() {
        assert_eq!(UreqTransport::default().body_limit(), DEFAULT_BODY_LIMIT);
        assert_eq!(UreqTransport::default().with_body_limit(16).body_limit(), 16);
    }

    #[test]
    fn response_debug_hides_body() {
        let response = HttpResponse {
            status: 200,
            body: "<Response>secret</Response>".to_string(),
        };
        let debug = format!("{response:?}");
        assert!(debug.contains("200"));
        assert!(!debug.contains("secret"));
    }
}
