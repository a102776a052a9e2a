//! Bearer tokens and the optional token cache.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderValue;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An access token returned by the token endpoint.
///
/// Parsed from the `token_type` and `access_token` fields of the token response,
/// without further validation. The value is zeroed on drop and redacted in `Debug`.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct BearerToken {
    token_type: String,
    access_token: String,
    #[serde(default, deserialize_with = "deserialize_expires_in")]
    #[zeroize(skip)]
    expires_in: Option<u64>,
}

/// Accepts a number or a numeric string, anything else means unknown.
fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().and_then(whole_seconds)),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_seconds))
        }
        _ => None,
    };
    Ok(seconds)
}

fn whole_seconds(seconds: f64) -> Option<u64> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .map(|duration| duration.as_secs())
}

impl BearerToken {
    /// Creates a token.
    pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
            expires_in: None,
        }
    }

    /// Sets the lifetime announced by the server.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in.as_secs());
        self
    }

    /// The token type, usually `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The access token value.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The lifetime announced by the server, if any.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in.map(Duration::from_secs)
    }

    /// Builds the `Authorization` header value: `{token_type} {access_token}`.
    ///
    /// The returned header is flagged as sensitive.
    pub(crate) fn authorization(&self) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        let mut value =
            HeaderValue::from_str(&format!("{} {}", self.token_type, self.access_token))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: BearerToken,
    expires_at: Instant,
}

/// Thread-safe cache for a single bearer token.
///
/// Only tokens with a known lifetime are kept, and a token is handed out only while it
/// has more than `refresh_threshold` left before expiry.
#[derive(Debug, Clone)]
pub(crate) struct TokenCache {
    inner: Arc<RwLock<Option<CachedToken>>>,
    refresh_threshold: Duration,
}

impl TokenCache {
    pub(crate) fn new(refresh_threshold: Duration) -> Self {
        Self {
            inner: Arc::default(),
            refresh_threshold,
        }
    }

    /// Returns the cached token if it is still fresh.
    pub(crate) async fn get(&self) -> Option<BearerToken> {
        let guard = self.inner.read().await;
        let horizon = Instant::now().checked_add(self.refresh_threshold)?;
        guard
            .as_ref()
            .filter(|cached| horizon < cached.expires_at)
            .map(|cached| cached.token.clone())
    }

    /// Stores `token` if its lifetime is known.
    pub(crate) async fn set(&self, token: &BearerToken) {
        let Some(expires_in) = token.expires_in() else {
            return;
        };
        let Some(expires_at) = Instant::now().checked_add(expires_in) else {
            debug!(?expires_in, "token lifetime out of range, not cached");
            return;
        };
        let cached = CachedToken {
            token: token.clone(),
            expires_at,
        };
        let mut guard = self.inner.write().await;
        *guard = Some(cached);
    }
}
