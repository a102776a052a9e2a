//! Grant type and scope requested at the token endpoint.

use serde::Serialize;

/// Grant type used when none is specified.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Scope used when none is specified, granting access to the whole data platform.
pub const DEFAULT_SCOPE: &str = "http://www.thinkministry.com/dataplatform/scopes/all";

/// The grant type and scope sent to the token endpoint.
///
/// Serializes to the `grant_type=<g>&scope=<s>` form body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantRequest {
    grant_type: String,
    scope: String,
}

impl GrantRequest {
    /// Creates a grant request.
    pub fn new(grant_type: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            grant_type: grant_type.into(),
            scope: scope.into(),
        }
    }

    /// Replaces the grant type.
    #[must_use]
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }

    /// Replaces the scope (a space-delimited list).
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// The grant type.
    pub fn grant_type(&self) -> &str {
        &self.grant_type
    }

    /// The scope, as given.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The individual scope tokens.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

impl Default for GrantRequest {
    fn default() -> Self {
        Self::new(DEFAULT_GRANT_TYPE, DEFAULT_SCOPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_client_credentials_and_full_scope() {
        let grant = GrantRequest::default();

        assert_eq!(grant.grant_type(), "client_credentials");
        assert_eq!(
            grant.scope(),
            "http://www.thinkministry.com/dataplatform/scopes/all"
        );
    }

    #[test]
    fn should_split_scopes_on_whitespace() {
        let grant = GrantRequest::default().with_scope("read  write\tadmin");

        assert_eq!(grant.scopes().collect::<Vec<_>>(), ["read", "write", "admin"]);
    }

    #[test]
    fn should_encode_as_form_body() {
        let grant = GrantRequest::default();
        let form = serde_urlencoded::to_string(&grant).expect("form encoding");

        insta::assert_snapshot!(form, @"grant_type=client_credentials&scope=http%3A%2F%2Fwww.thinkministry.com%2Fdataplatform%2Fscopes%2Fall");
    }
}
