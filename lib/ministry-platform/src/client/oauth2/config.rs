//! Everything needed to request a token once discovery is done.

use std::fmt;

use url::Url;

use super::grant::GrantRequest;
use super::token::TokenCache;
use crate::client::auth::ClientCredentials;

/// Token endpoint, credentials and grant of an initialized client.
#[derive(Clone)]
pub(crate) struct OAuth2Config {
    pub(crate) credentials: ClientCredentials,
    pub(crate) token_endpoint: Url,
    pub(crate) grant: GrantRequest,
    /// `None` means a fresh token for every call.
    pub(crate) token_cache: Option<TokenCache>,
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.credentials.client_id())
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("grant", &self.grant)
            .field("token_cache", &self.token_cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn should_redact_debug_output() {
        let config = OAuth2Config {
            credentials: ClientCredentials::new("client-id", "super-secret"),
            token_endpoint: Url::parse("https://auth.example.com/token").expect("valid url"),
            grant: GrantRequest::default(),
            token_cache: Some(TokenCache::new(Duration::from_secs(60))),
        };

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("client-id"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret"));
    }
}
