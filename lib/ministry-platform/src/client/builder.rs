use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::domain::DomainInfo;
use super::oauth2::{DiscoveryDocument, GrantRequest, OAuth2Config, TokenCache};
use super::transport::HttpTransport;
use super::{ApiClientError, WebApiClient};
use crate::config::ClientConfig;

/// Builder for creating [`WebApiClient`] instances.
///
/// # Default Configuration
///
/// - **Grant type**: `client_credentials`
/// - **Scope**: `http://www.thinkministry.com/dataplatform/scopes/all`
/// - **HTTP client**: a default `reqwest::Client`
/// - **Timeout**: none
/// - **Token cache**: disabled, every call acquires a new token
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use ministry_platform::WebApiClient;
///
/// # async fn example() -> Result<(), ministry_platform::ApiClientError> {
/// let client = WebApiClient::builder()
///     .with_scope("http://www.thinkministry.com/dataplatform/scopes/all")
///     .with_timeout(Duration::from_secs(30))
///     .build_from_env()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WebApiClientBuilder {
    client: Option<reqwest::Client>,
    grant: GrantRequest,
    timeout: Option<Duration>,
    token_cache: Option<Duration>,
}

impl WebApiClientBuilder {
    /// Sets the OAuth2 grant type (default `client_credentials`).
    #[must_use]
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant = self.grant.with_grant_type(grant_type);
        self
    }

    /// Sets the requested scope, a space-delimited list.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.grant = self.grant.with_scope(scope);
        self
    }

    /// Uses a preconfigured HTTP client (proxy, TLS roots, ...).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Bounds the duration of every HTTP call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reuses tokens until `refresh_threshold` before they expire.
    ///
    /// Only tokens whose response carries `expires_in` are reused.
    #[must_use]
    pub fn with_token_cache(mut self, refresh_threshold: Duration) -> Self {
        self.token_cache = Some(refresh_threshold);
        self
    }

    /// Reads the configuration from the environment, then [`build`](Self::build)s the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Configuration`] before any network call if a variable is
    /// missing, otherwise see [`build`](Self::build).
    pub async fn build_from_env(self) -> Result<WebApiClient, ApiClientError> {
        let config = ClientConfig::from_env()?;
        self.build(config).await
    }

    /// Connects to the platform and returns a ready client.
    ///
    /// Steps, stopping at the first failure:
    /// 1. fetch the discovery document,
    /// 2. validate the scope and grant type against it,
    /// 3. acquire a token,
    /// 4. read `{service_address}/domain` with that token.
    ///
    /// # Errors
    ///
    /// - [`ApiClientError::HttpClient`] if the default HTTP client cannot be created
    /// - [`ApiClientError::Discovery`] if step 1 fails
    /// - [`ApiClientError::InvalidScope`] / [`ApiClientError::InvalidGrantType`] if step 2 fails
    /// - [`ApiClientError::Authentication`] if step 3 fails
    /// - [`ApiClientError::Authorization`] if step 4 fails
    pub async fn build(self, config: ClientConfig) -> Result<WebApiClient, ApiClientError> {
        let Self {
            client,
            grant,
            timeout,
            token_cache,
        } = self;
        let ClientConfig {
            credentials,
            discovery_url,
            service_address,
        } = config;

        let client = match client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(ApiClientError::HttpClient)?,
        };
        let transport = HttpTransport::new(client, timeout);

        let discovery = DiscoveryDocument::resolve(&transport, &discovery_url).await?;
        discovery.validate(&grant)?;
        debug!(grant_type = grant.grant_type(), scope = grant.scope(), "grant validated");

        let oauth2 = OAuth2Config {
            credentials,
            token_endpoint: discovery.token_endpoint.clone(),
            grant,
            token_cache: token_cache.map(TokenCache::new),
        };
        let token = oauth2.get_valid_token(&transport).await?;
        let domain = DomainInfo::probe(&transport, &service_address, &token).await?;

        info!(
            domain = domain.name(),
            "Successfully created Web API client and connected to {}",
            domain.name()
        );

        Ok(WebApiClient {
            transport,
            service_address,
            discovery: Arc::new(discovery),
            oauth2,
            domain: Arc::new(domain),
        })
    }
}
