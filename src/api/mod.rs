//! API module for Azure Resource Manager interactions

mod client;
pub mod providers;

pub use client::ManagementClient;
