//! Azure Resource Manager REST client

use crate::auth::AccessToken;
use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Status plus parsed JSON body; non-success bodies are kept for error reporting
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// HTTP client for the management API
pub struct ManagementClient {
    http_client: Client,
    endpoint: String,
    api_version: String,
}

impl ManagementClient {
    /// Create a new management client
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("rpalias/", env!("CARGO_PKG_VERSION")));

        if config.insecure_skip_tls_verify {
            tracing::warn!(
                "TLS certificate verification is disabled for {}",
                config.management_endpoint
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.management_endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    /// Get the base API URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Make an authenticated GET request and parse the body as JSON.
    ///
    /// The body is parsed whatever the status; callers decide what a
    /// non-success status means.
    pub async fn get(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", token.secret()))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to the management API")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read management API response")?;
        let body: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse management API response (HTTP {status}) as JSON"))?;

        tracing::debug!(status = status.as_u16(), "Management API responded");
        Ok(ApiResponse { status, body })
    }
}
