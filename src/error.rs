//! Error taxonomy for an export run

use thiserror::Error;

/// Everything that can abort a run, matched once in `main`
#[derive(Debug, Error)]
pub enum AppError {
    /// The identity provider rejected the client-credentials grant
    #[error("Unable to obtain access token: {error}: {description} (correlation id: {correlation_id})")]
    Authentication {
        error: String,
        description: String,
        correlation_id: String,
    },

    /// The management API answered with something other than 200
    #[error("Failed resource provider query (HTTP {status}): {code}: {message}")]
    ResourceProviderQuery {
        status: u16,
        code: String,
        message: String,
    },

    /// Arguments or configuration rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network, parse and file errors
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code for this error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Unexpected(_) => 1,
            AppError::Authentication { .. } => 3,
            AppError::ResourceProviderQuery { .. } => 4,
            AppError::InvalidInput(_) => 5,
        }
    }
}
