//! Resource provider metadata API

use super::ManagementClient;
use crate::auth::AccessToken;
use crate::error::AppError;
use crate::models::{ArmErrorResponse, ResourceProvider};
use anyhow::Context;
use reqwest::StatusCode;

impl ManagementClient {
    /// Get a resource provider with its resource types and their aliases expanded
    pub async fn get_resource_provider(
        &self,
        token: &AccessToken,
        subscription_id: &str,
        namespace: &str,
    ) -> Result<ResourceProvider, AppError> {
        let path = format!(
            "subscriptions/{}/providers/{}",
            urlencoding::encode(subscription_id),
            urlencoding::encode(namespace)
        );
        let api_version = self.api_version().to_string();
        let query = [
            ("$expand", "resourceTypes/aliases"),
            ("api-version", api_version.as_str()),
        ];

        let response = self.get(token, &path, &query).await?;

        if response.status != StatusCode::OK {
            let details: ArmErrorResponse =
                serde_json::from_value(response.body).unwrap_or_default();

            tracing::error!("Failed resource provider query");
            tracing::error!("Error was: {}", details.error.code);
            tracing::error!("Error description was: {}", details.error.message);

            return Err(AppError::ResourceProviderQuery {
                status: response.status.as_u16(),
                code: details.error.code,
                message: details.error.message,
            });
        }

        let provider: ResourceProvider = serde_json::from_value(response.body)
            .context("Failed to parse resource provider response")?;

        tracing::info!(
            namespace = provider.namespace.as_deref().unwrap_or(namespace),
            resource_types = provider.resource_types.len(),
            aliases = provider.alias_count(),
            "Resource provider retrieved"
        );
        for rt in &provider.resource_types {
            tracing::debug!(
                resource_type = rt.resource_type.as_deref().unwrap_or("<unnamed>"),
                aliases = rt.aliases.len(),
                "Resource type"
            );
        }

        Ok(provider)
    }
}
