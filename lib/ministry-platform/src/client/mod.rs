use std::sync::Arc;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use reqwest::{Body, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;
use url::Url;

mod builder;
pub use self::builder::WebApiClientBuilder;

mod auth;
pub use self::auth::{ClientCredentials, SecureString};

mod domain;
pub use self::domain::DomainInfo;

pub mod oauth2;
pub use self::oauth2::{BearerToken, DiscoveryDocument, GrantRequest};

mod error;
pub use self::error::{ApiClientError, ErrorKind, UpstreamFailure};

mod transport;
use self::transport::HttpTransport;

use self::error::truncate_body;
use self::oauth2::OAuth2Config;
use crate::config::ClientConfig;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Authenticated client for the Ministry Platform REST API.
///
/// A `WebApiClient` only exists once the discovery document was fetched, the grant was
/// validated and a probe request succeeded, see [`WebApiClientBuilder::build`].
///
/// Every call acquires its own token (unless a token cache was enabled), so clones and
/// concurrent calls never share mutable state.
///
/// # Example
///
/// ```rust,no_run
/// use http::Method;
/// use ministry_platform::WebApiClient;
///
/// # async fn example() -> Result<(), ministry_platform::ApiClientError> {
/// let client = WebApiClient::from_env().await?;
///
/// let contacts = client
///     .request(Method::GET, "/tables/Contacts", &[("$top", "10")], None)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebApiClient {
    transport: HttpTransport,
    service_address: String,
    discovery: Arc<DiscoveryDocument>,
    oauth2: OAuth2Config,
    domain: Arc<DomainInfo>,
}

// Create
impl WebApiClient {
    /// Creates a builder.
    pub fn builder() -> WebApiClientBuilder {
        WebApiClientBuilder::default()
    }

    /// Connects with the default grant, reading the configuration from the environment.
    ///
    /// # Errors
    ///
    /// See [`WebApiClientBuilder::build_from_env`].
    pub async fn from_env() -> Result<Self, ApiClientError> {
        Self::builder().build_from_env().await
    }

    /// Connects with the default grant.
    ///
    /// # Errors
    ///
    /// See [`WebApiClientBuilder::build`].
    pub async fn connect(config: ClientConfig) -> Result<Self, ApiClientError> {
        Self::builder().build(config).await
    }
}

// Requests
impl WebApiClient {
    /// Sends an authenticated request and returns the JSON response.
    ///
    /// A token is acquired first, then `{method} {service_address}{path}` is sent with the
    /// `Authorization` header, a JSON content type, the `query` pairs and the optional JSON
    /// `body`. An empty response body is returned as `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`ApiClientError::Authentication`] if the token cannot be acquired
    /// - [`ApiClientError::Request`] if the call fails, carrying method, path, status and body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiClientError> {
        let url = build_url(&self.service_address, path, query)?;
        let token = self.oauth2.get_valid_token(&self.transport).await?;
        let request = build_request(method.clone(), url, &token, body)?;

        let (_, value) = exchange(&self.transport, request)
            .await
            .map_err(|upstream| {
                warn!(%method, path, %upstream, "request failed");
                ApiClientError::Request {
                    method,
                    path: path.to_string(),
                    upstream,
                }
            })?;
        Ok(value)
    }

    /// Like [`request`](Self::request), deserializing the response into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request), plus [`ApiClientError::Json`] with the path of
    /// the first mismatching field.
    pub async fn request_as<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let value = self.request(method, path, query, body).await?;
        let body = value.to_string();
        serde_path_to_error::deserialize(value).map_err(|err| ApiClientError::Json {
            path: err.path().to_string(),
            error: err.into_inner(),
            body: truncate_body(body),
        })
    }

    /// `GET` shorthand.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiClientError> {
        self.request(Method::GET, path, query, None).await
    }

    /// `POST` shorthand with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiClientError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT` shorthand with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiClientError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// `DELETE` shorthand.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiClientError> {
        self.request(Method::DELETE, path, query, None).await
    }
}

// Accessors
impl WebApiClient {
    /// The REST API base URL, without trailing slash.
    pub fn service_address(&self) -> &str {
        &self.service_address
    }

    /// The discovery document fetched at construction.
    pub fn discovery(&self) -> &DiscoveryDocument {
        &self.discovery
    }

    /// The validated grant type and scope.
    pub fn grant(&self) -> &GrantRequest {
        &self.oauth2.grant
    }

    /// The domain returned by the probe request.
    pub fn domain(&self) -> &DomainInfo {
        &self.domain
    }

    /// The OAuth2 client id.
    pub fn client_id(&self) -> &str {
        self.oauth2.credentials.client_id()
    }
}

/// Joins `path` to the service address and appends `query`.
pub(crate) fn build_url(
    service_address: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<Url, ApiClientError> {
    let raw = format!(
        "{}/{}",
        service_address.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&raw).map_err(|err| ApiClientError::InvalidUrl {
        url: raw.clone(),
        reason: err.to_string(),
    })?;

    if !query.is_empty() {
        let query_string = serde_urlencoded::to_string(query)?;
        let query_string = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{query_string}"),
            _ => query_string,
        };
        url.set_query(Some(&query_string));
    }

    Ok(url)
}

pub(crate) fn build_request(
    method: Method,
    url: Url,
    token: &BearerToken,
    body: Option<&Value>,
) -> Result<Request, ApiClientError> {
    let mut request = Request::new(method, url);
    let headers = request.headers_mut();
    headers.insert(AUTHORIZATION, token.authorization()?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

    if let Some(body) = body {
        *request.body_mut() = Some(Body::from(serde_json::to_vec(body)?));
    }

    Ok(request)
}

/// Sends `request` and reads a JSON body from a successful response.
pub(crate) async fn exchange(
    transport: &HttpTransport,
    request: Request,
) -> Result<(StatusCode, Value), UpstreamFailure> {
    let response = transport
        .execute(request)
        .await
        .map_err(|err| UpstreamFailure::network(&err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamFailure::from_response(response).await);
    }

    let body = response
        .text()
        .await
        .map_err(|err| UpstreamFailure::network(&err))?;
    if body.trim().is_empty() {
        return Ok((status, Value::Null));
    }

    let value = serde_json::from_str(&body)
        .map_err(|err| UpstreamFailure::malformed(status.as_u16(), err, body.clone()))?;
    Ok((status, value))
}
