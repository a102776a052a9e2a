//! Connection settings for a [`WebApiClient`](crate::WebApiClient).
//!
//! Settings are read from a [`ConfigSource`], the process environment by default:
//!
//! | Key                 | Meaning                                     |
//! |---------------------|---------------------------------------------|
//! | `OAuthClientID`     | Client id of the platform API Client        |
//! | `OAuthClientSecret` | Client secret of the platform API Client    |
//! | `OAuthBaseAddress`  | OAuth2 discovery URL                        |
//! | `ServiceAddress`    | Base URL of the platform REST API           |

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use url::Url;

use crate::client::{ApiClientError, ClientCredentials, SecureString};

/// A required configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigField {
    /// `OAuthClientID`
    #[display("OAuthClientID")]
    ClientId,
    /// `OAuthClientSecret`
    #[display("OAuthClientSecret")]
    ClientSecret,
    /// `OAuthBaseAddress`, the discovery URL.
    #[display("OAuthBaseAddress")]
    DiscoveryUrl,
    /// `ServiceAddress`, the REST API base URL.
    #[display("ServiceAddress")]
    ServiceAddress,
}

impl ConfigField {
    /// All fields, in the order they are read.
    pub const ALL: [Self; 4] = [
        Self::ClientId,
        Self::ClientSecret,
        Self::DiscoveryUrl,
        Self::ServiceAddress,
    ];

    /// The configuration key (environment variable name).
    pub fn key(self) -> &'static str {
        match self {
            Self::ClientId => "OAuthClientID",
            Self::ClientSecret => "OAuthClientSecret",
            Self::DiscoveryUrl => "OAuthBaseAddress",
            Self::ServiceAddress => "ServiceAddress",
        }
    }

    /// A remediation hint shown when the value is missing.
    pub fn hint(self) -> &'static str {
        match self {
            Self::ClientId => {
                "Make sure to include 'OAuthClientID' in your environment variables. This value should be the \
                 Client_ID of the API Client you want to use, found under Administration > API Clients."
            }
            Self::ClientSecret => {
                "Make sure to include 'OAuthClientSecret' in your environment variables. This value should be the \
                 Client_Secret of the API Client you want to use, found under Administration > API Clients."
            }
            Self::DiscoveryUrl => {
                "Make sure to include 'OAuthBaseAddress' in your environment variables. This value should be your \
                 discovery URL, see https://kb.ministryplatform.com/kb/develop/oauth-2-0"
            }
            Self::ServiceAddress => {
                "Make sure to include 'ServiceAddress' in your environment variables. This value should be your \
                 platform API URL, see https://kb.ministryplatform.com/kb/develop/rest-api"
            }
        }
    }

    fn missing(self) -> ApiClientError {
        ApiClientError::Configuration {
            field: self,
            hint: self.hint(),
        }
    }
}

/// Provides raw configuration values by key.
pub trait ConfigSource {
    /// Returns the value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads configuration from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<K, V, S> ConfigSource for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|value| value.as_ref().to_string())
    }
}

impl<K, V> ConfigSource for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).map(|value| value.as_ref().to_string())
    }
}

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) credentials: ClientCredentials,
    pub(crate) discovery_url: Url,
    pub(crate) service_address: String,
}

impl ClientConfig {
    /// Creates a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Configuration`] for an empty value and
    /// [`ApiClientError::InvalidConfigValue`] when a URL does not parse or the client id
    /// contains a colon.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
        discovery_url: impl AsRef<str>,
        service_address: impl AsRef<str>,
    ) -> Result<Self, ApiClientError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(ConfigField::ClientId.missing());
        }
        if client_id.contains(':') {
            return Err(ApiClientError::InvalidConfigValue {
                field: ConfigField::ClientId,
                reason: "client id cannot contain colon (:) character".to_string(),
            });
        }
        if client_secret.is_blank() {
            return Err(ConfigField::ClientSecret.missing());
        }

        let discovery_url = parse_url(ConfigField::DiscoveryUrl, discovery_url.as_ref())?;
        let service_url = parse_url(ConfigField::ServiceAddress, service_address.as_ref())?;
        let service_address = service_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            credentials: ClientCredentials::new(client_id.trim(), client_secret),
            discovery_url,
            service_address,
        })
    }

    /// Reads the four required values from `source`.
    ///
    /// Values are checked in the order of [`ConfigField::ALL`]; the first missing one is reported.
    /// Surrounding whitespace is trimmed, except from the client secret.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Configuration`] naming the first missing or empty key.
    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ApiClientError> {
        let read_raw = |field: ConfigField| {
            source
                .get(field.key())
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| field.missing())
        };
        let read = |field: ConfigField| read_raw(field).map(|value| value.trim().to_string());

        let client_id = read(ConfigField::ClientId)?;
        // kept verbatim, it is part of the Basic credentials
        let client_secret = read_raw(ConfigField::ClientSecret)?;
        let discovery_url = read(ConfigField::DiscoveryUrl)?;
        let service_address = read(ConfigField::ServiceAddress)?;

        Self::new(client_id, client_secret, discovery_url, service_address)
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_source`].
    pub fn from_env() -> Result<Self, ApiClientError> {
        Self::from_source(&EnvSource)
    }

    /// The client credentials.
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// The OAuth2 discovery URL.
    pub fn discovery_url(&self) -> &Url {
        &self.discovery_url
    }

    /// The REST API base URL, without trailing slash.
    pub fn service_address(&self) -> &str {
        &self.service_address
    }
}

fn parse_url(field: ConfigField, value: &str) -> Result<Url, ApiClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(field.missing());
    }
    let url = Url::parse(value).map_err(|err| ApiClientError::InvalidConfigValue {
        field,
        reason: format!("'{value}' is not a valid URL: {err}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiClientError::InvalidConfigValue {
            field,
            reason: format!("'{value}' must use http or https"),
        });
    }
    Ok(url)
}
