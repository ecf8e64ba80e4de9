//! Client-credentials grant against the Entra ID token endpoint

use crate::config::Config;
use crate::error::AppError;
use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

/// Scope for the Azure Resource Manager API
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com//.default";

/// Application credentials, used for a single token request
#[derive(Clone)]
pub struct Credentials {
    tenant_name: String,
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(
        tenant_name: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_name: tenant_name.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_name", &self.tenant_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token for the management API
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Token endpoint response; success and failure share one shape
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    correlation_id: Option<String>,
}

/// Authenticator that exchanges an application secret for an access token
pub struct ClientSecretAuthenticator {
    http_client: Client,
    authority: String,
    credentials: Credentials,
}

impl ClientSecretAuthenticator {
    /// Create an authenticator for `{authority_host}/{tenant}`
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self, AppError> {
        let authority = format!(
            "{}/{}",
            config.authority_host.trim_end_matches('/'),
            urlencoding::encode(credentials.tenant_name())
        );

        let mut builder = Client::builder().user_agent(concat!("rpalias/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            authority,
            credentials,
        })
    }

    /// Get the authority URL
    pub fn authority(&self) -> &str {
        &self.authority
    }

    fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority)
    }

    /// Request a token for `scopes` using the client-credentials grant.
    ///
    /// A response without `access_token` is an authentication failure; the
    /// provider's `error`, `error_description` and `correlation_id` are logged
    /// and carried in the returned error.
    pub async fn obtain_access_token(&self, scopes: &[&str]) -> Result<AccessToken, AppError> {
        tracing::info!("Attempting to obtain an access token...");
        tracing::debug!(
            authority = %self.authority,
            client_id = %self.credentials.client_id,
            "Requesting client-credentials token"
        );

        let scope = scopes.join(" ");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await
            .context("Failed to send token request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read token response")?;

        let token_response = match serde_json::from_str::<TokenResponse>(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Token response is not JSON: {}", e);
                TokenResponse {
                    error: Some(format!("http_{}", status.as_u16())),
                    error_description: Some(body),
                    ..Default::default()
                }
            }
        };

        if let Some(token) = token_response.access_token {
            tracing::info!("Access token successfully acquired");
            return Ok(AccessToken::new(token));
        }

        let error = token_response.error.unwrap_or_default();
        let description = token_response.error_description.unwrap_or_default();
        let correlation_id = token_response.correlation_id.unwrap_or_default();

        tracing::error!("Authentication failure");
        tracing::error!("Error was: {}", error);
        tracing::error!("Error description was: {}", description);
        tracing::error!("Error correlation_id was: {}", correlation_id);

        Err(AppError::Authentication {
            error,
            description,
            correlation_id,
        })
    }
}
