use std::fmt;

use http::HeaderValue;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::ApiClientError;
use crate::encoding::encode_base64;

/// Secure wrapper for sensitive string data that automatically zeroes memory on drop.
///
/// The value is never printed: `Debug` shows `[REDACTED]` and `Display` shows a mask.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner string value.
    ///
    /// # Security Note
    /// The returned reference should not be stored for extended periods
    /// to minimize exposure time of sensitive data.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the value is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn mask_sensitive(value: &str) -> String {
        let chars = value.chars().collect::<Vec<_>>();
        if chars.len() <= 8 {
            return "***".to_string();
        }
        let head = chars.iter().take(4).collect::<String>();
        let tail = chars.iter().skip(chars.len() - 4).collect::<String>();
        format!("{head}...{tail}")
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// OAuth2 client credentials of a Ministry Platform API Client.
///
/// Found under *Administration > API Clients* on the platform.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: SecureString,
}

impl ClientCredentials {
    /// Creates credentials from a client id and secret.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecureString>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns the client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &SecureString {
        &self.client_secret
    }

    /// Builds the `Basic base64(client_id:client_secret)` authorization value.
    ///
    /// The returned header is flagged as sensitive.
    pub(crate) fn basic_authorization(&self) -> Result<HeaderValue, ApiClientError> {
        let credentials = encode_base64(&format!(
            "{}:{}",
            self.client_id,
            self.client_secret.as_str()
        ));
        let mut value = HeaderValue::from_str(&format!("Basic {credentials}"))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}
