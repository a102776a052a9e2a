use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::oauth2::BearerToken;
use super::transport::HttpTransport;
use super::{ApiClientError, UpstreamFailure, build_request, build_url, exchange};

/// The platform domain, as returned by `GET {service_address}/domain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Name of the domain the credentials are authorized for.
    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Other fields of the domain.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DomainInfo {
    /// Confirms the token is authorized by reading the domain.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Authorization`] when the request fails, the server answers
    /// with a non-success status, or the body is not a JSON object.
    pub(crate) async fn probe(
        transport: &HttpTransport,
        service_address: &str,
        token: &BearerToken,
    ) -> Result<Self, ApiClientError> {
        let url = build_url(service_address, "/domain", &[])?;
        let request = build_request(Method::GET, url, token, None)?;

        let (status, value) = exchange(transport, request)
            .await
            .map_err(|upstream| ApiClientError::Authorization { upstream })?;

        let body = value.to_string();
        serde_json::from_value(value).map_err(|err| ApiClientError::Authorization {
            upstream: UpstreamFailure::malformed(status.as_u16(), err, body),
        })
    }

    /// The display name, or `"<unknown>"`.
    pub(crate) fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("<unknown>")
    }
}
