use std::time::Duration;

use reqwest::{Request, Response};
use tracing::debug;

/// The HTTP client shared by discovery, token and API calls.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub(crate) fn new(client: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    /// Sends a single request, no retry.
    pub(crate) async fn execute(&self, mut request: Request) -> Result<Response, reqwest::Error> {
        if let Some(timeout) = self.timeout {
            *request.timeout_mut() = Some(timeout);
        }

        debug!(?request, "sending...");
        let response = self.client.execute(request).await?;
        debug!(?response, "...receiving");

        Ok(response)
    }
}
