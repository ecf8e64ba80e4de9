//! Data models for Azure Resource Manager responses

mod arm_error;
mod provider;

pub use arm_error::ArmErrorResponse;
pub use provider::{AliasRow, ResourceProvider};
