use http::Method;

use crate::config::ConfigField;

/// Upstream bodies kept in errors are cut after this many bytes.
pub(crate) const BODY_MAX_LENGTH: usize = 1024;

/// Errors that can occur when using the [`WebApiClient`](crate::WebApiClient).
///
/// Every failure, from a missing environment variable to a rejected API call, is
/// reported through this type. Use [`ApiClientError::kind`] to match on the broad
/// category. Errors never contain the client secret.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// A required configuration value is missing or empty.
    #[display("Missing required configuration value: {field}. {hint}")]
    #[from(skip)]
    Configuration {
        /// The missing configuration key.
        field: ConfigField,
        /// How to fix it.
        hint: &'static str,
    },

    /// A configuration value is present but cannot be used.
    #[display("Invalid configuration value for {field}: {reason}")]
    #[from(skip)]
    InvalidConfigValue {
        /// The offending configuration key.
        field: ConfigField,
        /// Why the value was rejected.
        reason: String,
    },

    /// The underlying HTTP client could not be created.
    #[display("Failed to create the HTTP client: {_0}")]
    #[from(skip)]
    HttpClient(reqwest::Error),

    /// A header value contains characters not allowed in HTTP headers.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// Form or query string serialization failed.
    QuerySerialization(serde_urlencoded::ser::Error),

    /// The JSON request body could not be serialized.
    JsonValue(serde_json::Error),

    /// The OAuth2 discovery document could not be retrieved or understood.
    #[display(
        "Failed to retrieve the OAuth discovery document from '{url}' ({upstream}). \
         This value should be your discovery URL, see https://kb.ministryplatform.com/kb/develop/oauth-2-0"
    )]
    #[from(skip)]
    Discovery {
        /// The discovery URL that was queried.
        url: String,
        /// What the server (or the network) answered.
        upstream: UpstreamFailure,
    },

    /// At least one requested scope is not advertised by the server.
    #[display(
        "Invalid scope detected: the scope '{scope}' is not valid. Here is the list of valid scopes: {}",
        supported.join(", ")
    )]
    #[from(skip)]
    InvalidScope {
        /// The requested scope, as given.
        scope: String,
        /// The scopes advertised by the discovery document.
        supported: Vec<String>,
    },

    /// The requested grant type is not advertised by the server.
    #[display(
        "Invalid grant type detected: the grant type '{grant_type}' is not valid. Here is the list of valid grant types: {}",
        supported.join(", ")
    )]
    #[from(skip)]
    InvalidGrantType {
        /// The requested grant type.
        grant_type: String,
        /// The grant types advertised by the discovery document.
        supported: Vec<String>,
    },

    /// The token endpoint rejected the client credentials.
    #[display(
        "Failed to authenticate your client ({upstream}). Try checking your OAuthClientID and your OAuthClientSecret, \
         see https://kb.ministryplatform.com/kb/develop/oauth-2-0"
    )]
    #[from(skip)]
    Authentication {
        /// What the token endpoint answered.
        upstream: UpstreamFailure,
    },

    /// The client is authenticated but not allowed to read the platform domain.
    #[display(
        "Failed to retrieve domain data from authenticated user ({upstream}). Make sure the Client User on your \
         API Client has security roles, see https://kb.ministryplatform.com/kb/develop/giving-developers-access"
    )]
    #[from(skip)]
    Authorization {
        /// What the service answered to the probe request.
        upstream: UpstreamFailure,
    },

    /// An API request failed.
    #[display("Failed to make request {method} {path} ({upstream})")]
    #[from(skip)]
    Request {
        /// The HTTP method of the failed request.
        method: Method,
        /// The request path, relative to the service address.
        path: String,
        /// What the service answered.
        upstream: UpstreamFailure,
    },

    /// The request path does not produce a valid URL.
    #[display("Invalid request URL '{url}': {reason}")]
    #[from(skip)]
    InvalidUrl {
        /// The URL that failed to parse.
        url: String,
        /// The parser error.
        reason: String,
    },

    /// The JSON response does not match the expected type.
    #[display("Failed to deserialize JSON at '{path}': {error}\n{body}")]
    #[from(skip)]
    Json {
        /// The JSON path where deserialization failed.
        path: String,
        /// The underlying JSON error.
        error: serde_json::Error,
        /// The response body (truncated).
        body: String,
    },
}

/// Broad category of an [`ApiClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid configuration. Not retryable.
    Configuration,
    /// The discovery document could not be fetched.
    Discovery,
    /// The requested grant type or scope is not supported by the server.
    Validation,
    /// The token exchange was rejected.
    Authentication,
    /// The credentials are valid but lack permissions.
    Authorization,
    /// An API request failed.
    Request,
}

impl ApiClientError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::InvalidConfigValue { .. } | Self::HttpClient(_) => {
                ErrorKind::Configuration
            }
            Self::Discovery { .. } => ErrorKind::Discovery,
            Self::InvalidScope { .. } | Self::InvalidGrantType { .. } => ErrorKind::Validation,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::InvalidHeaderValue(_)
            | Self::QuerySerialization(_)
            | Self::JsonValue(_)
            | Self::Request { .. }
            | Self::InvalidUrl { .. }
            | Self::Json { .. } => ErrorKind::Request,
        }
    }

    /// Returns the upstream failure, if this error comes from an HTTP exchange.
    pub fn upstream(&self) -> Option<&UpstreamFailure> {
        match self {
            Self::Discovery { upstream, .. }
            | Self::Authentication { upstream }
            | Self::Authorization { upstream }
            | Self::Request { upstream, .. } => Some(upstream),
            _ => None,
        }
    }

    /// Returns the upstream HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        self.upstream().and_then(UpstreamFailure::status)
    }
}

/// What went wrong on the other side of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum UpstreamFailure {
    /// The server answered with a non-success status.
    #[display("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body (truncated).
        body: String,
    },

    /// No response was received.
    #[display("network error: {reason}")]
    Network {
        /// Description of the transport failure.
        reason: String,
    },

    /// The server answered successfully but the body is not what was expected.
    #[display("unexpected response (HTTP {status}): {reason}")]
    Malformed {
        /// The HTTP status code.
        status: u16,
        /// Why the body was rejected.
        reason: String,
        /// The response body (truncated).
        body: String,
    },
}

impl UpstreamFailure {
    /// Returns the HTTP status code, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
            Self::Network { .. } => None,
        }
    }

    /// Returns the response body, if a response was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::Malformed { body, .. } => Some(body),
            Self::Network { .. } => None,
        }
    }

    pub(crate) fn network(error: &reqwest::Error) -> Self {
        Self::Network {
            reason: error.to_string(),
        }
    }

    pub(crate) fn malformed(status: u16, reason: impl ToString, body: String) -> Self {
        Self::malformed_redacted(status, reason, body, "")
    }

    /// Like [`malformed`](Self::malformed), removing `secret` from the full body first.
    pub(crate) fn malformed_redacted(
        status: u16,
        reason: impl ToString,
        body: String,
        secret: &str,
    ) -> Self {
        Self::Malformed {
            status,
            reason: redact_text(reason.to_string(), secret),
            body: truncate_body(redact_text(body, secret)),
        }
    }

    /// Reads the status and body of a failed response.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        Self::from_response_redacted(response, "").await
    }

    /// Like [`from_response`](Self::from_response), removing `secret` from the full body
    /// before it is truncated.
    pub(crate) async fn from_response_redacted(response: reqwest::Response, secret: &str) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map(|body| truncate_body(redact_text(body, secret)))
            .unwrap_or_else(|err| format!("<unable to read response body: {err}>"));
        Self::Status { status, body }
    }

    /// Replaces every occurrence of `secret` in the body and reason.
    pub(crate) fn redact(self, secret: &str) -> Self {
        match self {
            Self::Status { status, body } => Self::Status {
                status,
                body: redact_text(body, secret),
            },
            Self::Malformed {
                status,
                reason,
                body,
            } => Self::Malformed {
                status,
                reason: redact_text(reason, secret),
                body: redact_text(body, secret),
            },
            Self::Network { reason } => Self::Network {
                reason: redact_text(reason, secret),
            },
        }
    }
}

fn redact_text(text: String, secret: &str) -> String {
    if secret.is_empty() {
        return text;
    }
    text.replace(secret, "[REDACTED]")
}

pub(crate) fn truncate_body(text: String) -> String {
    if text.len() <= BODY_MAX_LENGTH {
        return text;
    }
    let end = (0..=BODY_MAX_LENGTH)
        .rev()
        .find(|idx| text.is_char_boundary(*idx))
        .unwrap_or_default();
    format!("{}... (truncated)", text.get(..end).unwrap_or_default())
}
