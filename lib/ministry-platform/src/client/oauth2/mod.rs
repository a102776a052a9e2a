//! OAuth2 client credentials support.
//!
//! The flow is the one of a Ministry Platform API Client:
//!
//! 1. fetch the [`DiscoveryDocument`] from the discovery URL (`OAuthBaseAddress`),
//! 2. check the requested [`GrantRequest`] against the advertised scopes and grant types,
//! 3. exchange the client credentials for a [`BearerToken`] at the `token_endpoint`,
//!    using HTTP Basic authentication.
//!
//! Tokens are not reused between calls unless the client is built with
//! [`with_token_cache`](crate::WebApiClientBuilder::with_token_cache).

mod config;
mod discovery;
mod grant;
mod provider;
mod token;

pub(crate) use self::config::OAuth2Config;
pub use self::discovery::DiscoveryDocument;
pub use self::grant::{DEFAULT_GRANT_TYPE, DEFAULT_SCOPE, GrantRequest};
pub(crate) use self::token::TokenCache;
pub use self::token::BearerToken;
