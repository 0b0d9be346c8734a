//! MWS call orchestration.
//!
//! # Design
//! `MwsClient` holds the base URL, optional credentials, a default timeout
//! and a `Transport`. A call is a straight pipeline: caller parameters are
//! checked against the reserved names and encoded, the query string is
//! assembled, the transport performs the GET, and the body is parsed and
//! interpreted. `build_call` and `parse_response` expose the two halves so a
//! host can run the I/O itself.
//!
//! Nothing is carried between calls. `SessionToken` is recomputed from the
//! stored credentials every time; it is not a server-issued session.
//!
//! The client is not synchronized. Changing credentials while a call is in
//! flight on another thread needs external locking.

use std::time::Duration;

use url::Url;

use crate::encoder;
use crate::error::{ArgumentError, ClientError, FailedRequestError, InterpretationError, InvalidBaseUrl};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::interpreter;
use crate::types::{Credentials, ParameterValue, Parameters, Redacted, ResponseTable};
use crate::xml;

/// Timeout used when neither the client nor the call sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters set by the client. Callers may not supply them.
pub const RESERVED_PARAMETERS: [&str; 4] = ["Library", "Function", "Type", "SessionToken"];

/// Blocking client for MWS.
#[derive(Debug, Clone)]
pub struct MwsClient<T = UreqTransport> {
    base_url: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    transport: T,
}

impl MwsClient<UreqTransport> {
    /// Create a client for `base_url`, e.g. `https://school.example:8800`.
    ///
    /// The URL must be absolute, use `https` and carry no query or fragment.
    pub fn new(base_url: &str) -> Result<Self, InvalidBaseUrl> {
        Self::with_transport(base_url, UreqTransport::default())
    }
}

impl<T: Transport> MwsClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Result<Self, InvalidBaseUrl> {
        Ok(Self {
            base_url: validate_base_url(base_url)?,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            transport,
        })
    }

    /// Replace the default timeout used by `call` and `get_data`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials = Some(Credentials::new(username, password));
    }

    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Fetch rows of a `Data.GetData` layout.
    ///
    /// Requires credentials, and `parameters` must be a keyed mapping; it is
    /// sent as the `Parameters` call parameter.
    pub fn get_data(
        &self,
        layout: &str,
        parameters: impl Into<ParameterValue>,
    ) -> Result<ResponseTable, ClientError> {
        if !self.has_credentials() {
            return Err(ClientError::NoCredentials);
        }

        let parameters = parameters.into();
        if !parameters.is_keyed() {
            return Err(ArgumentError::NotKeyed {
                kind: parameters.kind(),
            }
            .into());
        }

        let params = Parameters::new()
            .with("Layout", layout)
            .with("Parameters", parameters);
        self.call("Data", "GetData", &params)
    }

    /// Call `library`.`function` with the client's default timeout.
    pub fn call(
        &self,
        library: &str,
        function: &str,
        parameters: &Parameters,
    ) -> Result<ResponseTable, ClientError> {
        self.call_with_timeout(library, function, parameters, self.timeout)
    }

    /// Call `library`.`function`; `timeout` bounds the transport step only.
    pub fn call_with_timeout(
        &self,
        library: &str,
        function: &str,
        parameters: &Parameters,
        timeout: Duration,
    ) -> Result<ResponseTable, ClientError> {
        tracing::debug!(
            library,
            function,
            parameters = parameters.len(),
            credentials = self.has_credentials(),
            "calling MWS"
        );

        let request = self.build_call(library, function, parameters, timeout)?;
        let response = self.transport.get(&request).map_err(|e| {
            tracing::warn!(library, function, error = %e, "MWS request failed");
            FailedRequestError::Transport(e)
        })?;

        self.parse_response(response).inspect_err(|e| {
            tracing::warn!(library, function, error = %e, "MWS call failed");
        })
    }

    /// Build the GET request for a call without sending it.
    ///
    /// Fails before any I/O on a reserved parameter name or an unencodable
    /// value.
    pub fn build_call(
        &self,
        library: &str,
        function: &str,
        parameters: &Parameters,
        timeout: Duration,
    ) -> Result<HttpRequest, ClientError> {
        if let Some((key, _)) = parameters
            .iter()
            .find(|(key, _)| RESERVED_PARAMETERS.contains(key))
        {
            return Err(ArgumentError::ReservedParameter(key.to_string()).into());
        }

        let encoded = parameters
            .iter()
            .map(|(key, value)| Ok((key, encoder::encode(value)?)))
            .collect::<Result<Vec<_>, ClientError>>()?;

        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("Library", library)
                .append_pair("Function", function)
                .append_pair("Type", "xml");
            if let Some(credentials) = &self.credentials {
                query.append_pair("SessionToken", credentials.session_token().expose());
            }
            for (key, value) in &encoded {
                query.append_pair(key, value.as_str());
            }
        }

        Ok(HttpRequest { url, timeout })
    }

    /// Interpret the response to a request from `build_call`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ResponseTable, ClientError> {
        tracing::debug!(
            status = response.status,
            body_len = response.body.len(),
            "MWS response received"
        );
        if response.status != 200 {
            return Err(FailedRequestError::UnexpectedStatus {
                status: response.status,
                body: Redacted::new(response.body),
            }
            .into());
        }

        let document = xml::parse_document(&response.body).map_err(|source| {
            InterpretationError::MalformedXml {
                body: Redacted::new(response.body.clone()),
                source,
            }
        })?;

        let rows = interpreter::interpret(&document.root_element())?;
        tracing::debug!(rows = rows.len(), "MWS call succeeded");
        Ok(rows)
    }
}

fn validate_base_url(base_url: &str) -> Result<Url, InvalidBaseUrl> {
    let url = Url::parse(base_url).map_err(InvalidBaseUrl::Malformed)?;
    if url.scheme() != "https" {
        return Err(InvalidBaseUrl::NotHttps(url.scheme().to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(InvalidBaseUrl::QueryOrFragment);
    }
    Ok(url)
}
