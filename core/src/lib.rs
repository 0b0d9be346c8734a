//! Blocking client core for MWS, a remote tabular-data service spoken to over
//! HTTPS GET with XML responses.
//!
//! # Overview
//! A call encodes caller parameters into MWS's flat text grammar, sends them
//! as a query string alongside the control parameters (`Library`,
//! `Function`, `Type`, `SessionToken`), and decodes the XML response into
//! rows of text columns, or into a classified error.
//!
//! # Design
//! - `encoder` and `interpreter` are pure and share no state.
//! - `interpreter` works on the `xml::XmlNode` trait, not on a parser type.
//! - `MwsClient` keeps the host-does-IO split (`build_call` /
//!   `parse_response`) and binds it through a `Transport` in `call`.
//! - Secrets and raw payloads in errors sit behind `Redacted`.

pub mod client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod http;
pub mod interpreter;
pub mod types;
pub mod xml;

pub use client::{MwsClient, DEFAULT_TIMEOUT, RESERVED_PARAMETERS};
pub use config::{ClientConfig, ConfigError};
pub use encoder::{encode, EncodedParameter};
pub use error::{
    ArgumentError, ClientError, EncodingError, FailedRequestError, InterpretationError,
    InvalidBaseUrl, TransportError,
};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_BODY_LIMIT};
pub use interpreter::{interpret, parse_table};
pub use types::{Credentials, ParameterValue, Parameters, Redacted, ResponseTable, Row, Scalar};
pub use xml::XmlNode;
