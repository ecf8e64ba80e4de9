//! ARM error envelope

use serde::Deserialize;

/// Body returned by the management API on failure: `{"error": {"code", "message"}}`
#[derive(Debug, Default, Deserialize)]
pub struct ArmErrorResponse {
    #[serde(rename = "error", default)]
    pub error: ArmError,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArmError {
    #[serde(rename = "code", default)]
    pub code: String,

    #[serde(rename = "message", default)]
    pub message: String,
}
