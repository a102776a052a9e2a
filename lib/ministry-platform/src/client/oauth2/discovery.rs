//! OAuth2 server metadata discovery.

use http::Method;
use reqwest::Request;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use super::GrantRequest;
use crate::client::transport::HttpTransport;
use crate::client::{ApiClientError, UpstreamFailure};

/// Server metadata published at the discovery URL.
///
/// Only the token endpoint and the supported scopes and grant types are used; every
/// other field is kept untouched in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Where client credentials are exchanged for a token.
    pub token_endpoint: Url,

    /// Scopes the server accepts. Absent means none.
    #[serde(default, deserialize_with = "deserialize_list")]
    pub scopes_supported: Vec<String>,

    /// Grant types the server accepts. Absent means none.
    #[serde(default, deserialize_with = "deserialize_list")]
    pub grant_types_supported: Vec<String>,

    /// Other server-declared fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts `null`, an array, or a space separated string.
fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
    }

    let list = match Option::<StringOrVec>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrVec::String(value)) => value.split_whitespace().map(String::from).collect(),
        Some(StringOrVec::Vec(values)) => values,
    };
    Ok(list)
}

impl DiscoveryDocument {
    /// Fetches and parses the discovery document.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Discovery`] when the request fails, the server answers
    /// with a non-success status, or the body is not a discovery document with a valid
    /// `token_endpoint` URL.
    pub(crate) async fn resolve(
        transport: &HttpTransport,
        discovery_url: &Url,
    ) -> Result<Self, ApiClientError> {
        let discovery_error = |upstream| ApiClientError::Discovery {
            url: discovery_url.to_string(),
            upstream,
        };

        debug!(url = %discovery_url, "resolving OAuth2 discovery document");
        let request = Request::new(Method::GET, discovery_url.clone());
        let response = transport
            .execute(request)
            .await
            .map_err(|err| discovery_error(UpstreamFailure::network(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let upstream = UpstreamFailure::from_response(response).await;
            warn!(%upstream, "discovery request failed");
            return Err(discovery_error(upstream));
        }

        let body = response
            .text()
            .await
            .map_err(|err| discovery_error(UpstreamFailure::network(&err)))?;
        let document = serde_json::from_str::<Self>(&body).map_err(|err| {
            discovery_error(UpstreamFailure::malformed(status.as_u16(), err, body.clone()))
        })?;

        debug!(token_endpoint = %document.token_endpoint, "discovery document resolved");
        Ok(document)
    }

    /// Checks that the server supports the requested scope and grant type.
    ///
    /// Every whitespace-separated scope token must be advertised in `scopes_supported`,
    /// and the grant type in `grant_types_supported`. Scopes are checked first. A blank
    /// scope is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidScope`] or [`ApiClientError::InvalidGrantType`],
    /// both listing the values the server supports.
    pub fn validate(&self, grant: &GrantRequest) -> Result<(), ApiClientError> {
        let mut scopes = grant.scopes().peekable();
        let blank = scopes.peek().is_none();
        if blank || !scopes.all(|scope| self.supports_scope(scope)) {
            return Err(ApiClientError::InvalidScope {
                scope: grant.scope().to_string(),
                supported: self.scopes_supported.clone(),
            });
        }

        if !self.supports_grant_type(grant.grant_type()) {
            return Err(ApiClientError::InvalidGrantType {
                grant_type: grant.grant_type().to_string(),
                supported: self.grant_types_supported.clone(),
            });
        }

        Ok(())
    }

    /// Returns `true` if `scope` is advertised by the server.
    pub fn supports_scope(&self, scope: &str) -> bool {
        self.scopes_supported.iter().any(|it| it == scope)
    }

    /// Returns `true` if `grant_type` is advertised by the server.
    pub fn supports_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types_supported.iter().any(|it| it == grant_type)
    }
}
