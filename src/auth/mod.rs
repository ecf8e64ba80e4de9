//! Auth module for Entra ID client-credentials authentication
//!
//! Provides token acquisition for the Azure Resource Manager API using an
//! application's client id and secret.

mod client_secret;

pub use client_secret::{AccessToken, ClientSecretAuthenticator, Credentials, MANAGEMENT_SCOPE};
