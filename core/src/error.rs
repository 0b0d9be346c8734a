//! Error types for the MWS client.
//!
//! # Design
//! One enum per component: `EncodingError` for the parameter encoder,
//! `InterpretationError` for the response interpreter, and `ClientError`
//! aggregating those with the client's own failure kinds. Causes are chained
//! through `#[source]` so the full path (element key, error table, XML parser)
//! is visible without re-running the call.
//!
//! Fields that may contain secrets or raw response bodies are wrapped in
//! `Redacted`, which never prints its contents. Messages themselves never
//! embed parameter values or response payloads.

use crate::types::Redacted;

/// A parameter value could not be encoded into its query-string form.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The value is outside the permitted variant set (e.g. a nested collection).
    #[error("value of type '{kind}' is not supported, expected null, bool, integer, float, text or a flat collection")]
    UnsupportedType { kind: &'static str },

    /// An encoded sequence element contains `,`.
    #[error("encoded elements of a sequence must not contain ','")]
    SequenceSeparator { encoded: Redacted<String> },

    /// An encoded mapping value contains `;` or `=`.
    #[error("encoded values of a mapping must not contain ';' or '='")]
    MappingSeparator { encoded: Redacted<String> },

    /// A mapping key contains `;` or `=`.
    #[error("mapping keys must not contain ';' or '='")]
    MappingKey,

    /// Wraps the failure of one collection element with its index or key.
    #[error("could not encode element at '{key}'")]
    Element {
        key: String,
        #[source]
        source: Box<EncodingError>,
    },
}

impl EncodingError {
    pub(crate) fn at(key: impl Into<String>, source: EncodingError) -> Self {
        EncodingError::Element {
            key: key.into(),
            source: Box::new(source),
        }
    }
}

/// The response document does not satisfy the MWS response contract.
///
/// `segment` holds the markup of the node where interpretation failed.
#[derive(Debug, thiserror::Error)]
pub enum InterpretationError {
    #[error("response body is not well-formed XML")]
    MalformedXml {
        body: Redacted<String>,
        #[source]
        source: roxmltree::Error,
    },

    #[error("MWS returned exception: {exception} - {message}")]
    RemoteException {
        exception: String,
        message: String,
        segment: Redacted<String>,
    },

    #[error("missing Result node")]
    MissingResult { segment: Redacted<String> },

    #[error("missing Table node")]
    MissingTable { segment: Redacted<String> },

    #[error("incorrect amount of child nodes for response table, expected 1 got {count}")]
    TableShape {
        count: usize,
        segment: Redacted<String>,
    },

    #[error("unexpected child node of {plural} in response table, expected '{expected}' got '{actual}'")]
    MixedRowNames {
        plural: String,
        expected: String,
        actual: String,
        segment: Redacted<String>,
    },

    #[error("row {index} of response table has columns [{actual}], expected [{expected}]")]
    MixedColumns {
        index: usize,
        expected: String,
        actual: String,
        segment: Redacted<String>,
    },

    #[error("MWS returned non-true result ({result}) with the following errors: {summaries}")]
    Unsuccessful {
        result: String,
        summaries: String,
        segment: Redacted<String>,
    },

    #[error("MWS returned non-true result ({result}) and could not parse response table with errors")]
    UnreadableErrorTable {
        result: String,
        segment: Redacted<String>,
        #[source]
        source: Box<InterpretationError>,
    },
}

/// Malformed call arguments, detected before anything is sent.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("MWS call parameter '{0}' is reserved")]
    ReservedParameter(String),

    #[error("parameters must be a keyed mapping, got a {kind}")]
    NotKeyed { kind: &'static str },
}

/// A failure reported by the transport collaborator.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// The request to MWS did not complete with a usable response.
#[derive(Debug, thiserror::Error)]
pub enum FailedRequestError {
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    #[error("unexpected response code: {status}")]
    UnexpectedStatus { status: u16, body: Redacted<String> },
}

/// Errors returned by `MwsClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("MWS client does not have credentials")]
    NoCredentials,

    #[error(transparent)]
    FailedRequest(#[from] FailedRequestError),

    #[error(transparent)]
    Interpretation(#[from] InterpretationError),
}

/// The base URL handed to `MwsClient::new` is unusable.
#[derive(Debug, thiserror::Error)]
pub enum InvalidBaseUrl {
    #[error("malformed base URL: {0}")]
    Malformed(#[source] url::ParseError),

    #[error("invalid base URL, must use HTTPS, got scheme '{0}'")]
    NotHttps(String),

    #[error("invalid base URL, must not contain query or fragment component")]
    QueryOrFragment,
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn element_error_chains_to_cause_without_value() {
        let err = EncodingError::at(
            "1",
            EncodingError::SequenceSeparator {
                encoded: Redacted::new("secret,value".to_string()),
            },
        );
        assert_eq!(err.to_string(), "could not encode element at '1'");
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "encoded elements of a sequence must not contain ','");
        assert!(!format!("{err:?}").contains("secret"));
    }

    #[test]
    fn unexpected_status_hides_body() {
        let err = ClientError::from(FailedRequestError::UnexpectedStatus {
            status: 500,
            body: Redacted::new("password=hunter2".to_string()),
        });
        assert_eq!(err.to_string(), "unexpected response code: 500");
        assert!(!format!("{err:?}").contains("hunter2"));
    }

    #[test]
    fn transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = TransportError::with_source("request failed", io);
        assert_eq!(err.to_string(), "request failed");
        assert_eq!(err.source().unwrap().to_string(), "timed out");
    }
}
