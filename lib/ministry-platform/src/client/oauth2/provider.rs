//! Client credentials token exchange.

use http::Method;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Body, Request};
use tracing::{debug, warn};

use super::config::OAuth2Config;
use super::token::BearerToken;
use crate::client::transport::HttpTransport;
use crate::client::{ApiClientError, UpstreamFailure};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl OAuth2Config {
    /// Exchanges the client credentials for a new token.
    ///
    /// Sends `grant_type` and `scope` as a form to the token endpoint, authenticated with
    /// HTTP Basic. Any occurrence of the client secret in a failure body is redacted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Authentication`] when the request fails, the server
    /// answers with a non-success status, or the response has no `token_type` /
    /// `access_token`.
    pub(crate) async fn acquire_token(
        &self,
        transport: &HttpTransport,
    ) -> Result<BearerToken, ApiClientError> {
        let secret = self.credentials.client_secret().as_str();
        let authentication_error = |upstream: UpstreamFailure| ApiClientError::Authentication {
            upstream: upstream.redact(secret),
        };

        let form = serde_urlencoded::to_string(&self.grant)?;
        let mut request = Request::new(Method::POST, self.token_endpoint.clone());
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, self.credentials.basic_authorization()?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        *request.body_mut() = Some(Body::from(form));

        let response = transport
            .execute(request)
            .await
            .map_err(|err| authentication_error(UpstreamFailure::network(&err)))?;

        let status = response.status();
        if !status.is_success() {
            let error = authentication_error(
                UpstreamFailure::from_response_redacted(response, secret).await,
            );
            warn!(status = status.as_u16(), "token request rejected");
            return Err(error);
        }

        let body = response
            .text()
            .await
            .map_err(|err| authentication_error(UpstreamFailure::network(&err)))?;
        let token = serde_json::from_str::<BearerToken>(&body).map_err(|err| {
            authentication_error(UpstreamFailure::malformed_redacted(
                status.as_u16(),
                err,
                body.clone(),
                secret,
            ))
        })?;

        debug!(token_type = token.token_type(), "token acquired");
        Ok(token)
    }

    /// Returns a token for the next call.
    ///
    /// Without a token cache this always acquires a new token. With one, a fresh cached
    /// token is reused and newly acquired tokens are stored.
    pub(crate) async fn get_valid_token(
        &self,
        transport: &HttpTransport,
    ) -> Result<BearerToken, ApiClientError> {
        let Some(cache) = &self.token_cache else {
            return self.acquire_token(transport).await;
        };

        if let Some(token) = cache.get().await {
            debug!("reusing cached token");
            return Ok(token);
        }

        let token = self.acquire_token(transport).await?;
        cache.set(&token).await;
        Ok(token)
    }
}
