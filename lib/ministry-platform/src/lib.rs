//! # Ministry Platform
//!
//! Authenticated client for the Ministry Platform REST API.
//!
//! The client discovers the OAuth2 server metadata at runtime, checks that the requested
//! grant type and scope are supported, exchanges the API Client credentials for a bearer
//! token and confirms it can read the platform domain. It then exposes a generic
//! [`request`](WebApiClient::request) operation that authenticates every call.
//!
//! ## Quick Start
//!
//! Set the four environment variables `OAuthClientID`, `OAuthClientSecret`,
//! `OAuthBaseAddress` (the discovery URL) and `ServiceAddress` (the REST API URL), then:
//!
//! ```rust,no_run
//! use http::Method;
//! use ministry_platform::WebApiClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebApiClient::from_env().await?;
//!
//! let contacts = client
//!     .request(Method::GET, "/tables/Contacts", &[("$top", "10")], None)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Explicit configuration
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//!
//! use ministry_platform::{ClientConfig, WebApiClient};
//!
//! # async fn example() -> Result<(), ministry_platform::ApiClientError> {
//! let source = BTreeMap::from([
//!     ("OAuthClientID", "my-client"),
//!     ("OAuthClientSecret", "my-secret"),
//!     ("OAuthBaseAddress", "https://my.church.org/ministryplatformapi/oauth/.well-known/openid-configuration"),
//!     ("ServiceAddress", "https://my.church.org/ministryplatformapi"),
//! ]);
//! let config = ClientConfig::from_source(&source)?;
//!
//! let client = WebApiClient::builder()
//!     .with_timeout(Duration::from_secs(30))
//!     .build(config)
//!     .await?;
//! println!("connected to {:?}", client.domain().display_name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`ApiClientError`]; [`ApiClientError::kind`] gives the broad
//! category (configuration, discovery, validation, authentication, authorization or
//! request). Upstream status and body are kept, the client secret never is.
//!
//! ## Tokens
//!
//! By default a new token is acquired for every request. Use
//! [`WebApiClientBuilder::with_token_cache`] to reuse tokens that announce an expiry.

mod client;
pub use self::client::{
    ApiClientError, BearerToken, ClientCredentials, DiscoveryDocument, DomainInfo, ErrorKind,
    GrantRequest, SecureString, UpstreamFailure, WebApiClient, WebApiClientBuilder, oauth2,
};

pub mod config;
pub use self::config::{ClientConfig, ConfigField, ConfigSource, EnvSource};

mod encoding;
pub use self::encoding::encode_base64;
