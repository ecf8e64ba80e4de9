//! rpalias - export Azure resource provider aliases to CSV
//!
//! Authenticates with an application's client id and secret, reads a
//! resource provider's metadata from Azure Resource Manager with its
//! resource type aliases expanded, and writes every `name`/`defaultPath`
//! pair to a CSV file.

mod api;
mod auth;
mod config;
mod error;
mod export;
mod models;
mod validation;

use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::ManagementClient;
use crate::auth::{ClientSecretAuthenticator, Credentials, MANAGEMENT_SCOPE};
use crate::config::Config;
use crate::error::AppError;
use crate::validation::validate_segment;

/// rpalias - Resource provider alias exporter
#[derive(Parser)]
#[command(name = "rpalias")]
#[command(about = "Export the policy aliases of an Azure resource provider to CSV")]
#[command(version)]
struct Args {
    /// Azure AD tenant name (e.g., contoso.onmicrosoft.com)
    #[arg(long = "tenantname", env = "AZURE_TENANT_NAME")]
    tenant_name: String,

    /// Client ID of application
    #[arg(long = "clientid", env = "AZURE_CLIENT_ID")]
    client_id: String,

    /// Client secret of application
    #[arg(long = "clientsecret", env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Subscription ID to query
    #[arg(long = "subscriptionid", env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: String,

    /// Resource provider namespace such as Microsoft.Web
    #[arg(long = "resourceprovider")]
    resource_provider: String,

    /// Full path of the export file
    #[arg(long = "exportfile")]
    export_file: PathBuf,

    /// Do not verify the management API's TLS certificate
    #[arg(long)]
    insecure_skip_tls_verify: bool,

    /// Configuration file (defaults to <config dir>/rpalias/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also append log records to this file
    #[arg(long = "logfile")]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = load_config(&args);

    // A broken config file must not stop --logfile from being honoured
    let log_path = match &config {
        Ok(config) => config.log_file.clone(),
        Err(_) => args.log_file.clone(),
    };
    let (log_file, log_error) = match log_path.as_deref().map(open_log_file).transpose() {
        Ok(file) => (file, None),
        Err(err) => (None, Some(err)),
    };
    logging_subscriber(args.verbose, log_file).init();

    let result = match (config, log_error) {
        (Err(err), _) | (Ok(_), Some(err)) => Err(err),
        (Ok(config), None) => execute(args, &config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Authentication and query failures are logged field by field where they occur
            match &err {
                AppError::Unexpected(source) => tracing::error!("Execution error: {:?}", source),
                AppError::InvalidInput(_) => tracing::error!("{}", err),
                AppError::Authentication { .. } | AppError::ResourceProviderQuery { .. } => {}
            }
            ExitCode::from(err.exit_code())
        }
    }
}

/// Stderr output, plus an ANSI-free copy in `log_file` when given.
///
/// RUST_LOG takes precedence over `verbose`.
fn logging_subscriber(
    verbose: bool,
    log_file: Option<File>,
) -> impl tracing::Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(file_layer)
}

fn open_log_file(path: &Path) -> Result<File, AppError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::InvalidInput(format!("Could not open log file {}: {e}", path.display())))
}

/// Load the config file, then apply command line overrides
fn load_config(args: &Args) -> Result<Config, AppError> {
    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| AppError::InvalidInput(format!("{e:#}")))?;
    apply_overrides(&mut config, args);
    Ok(config)
}

/// Flags given on the command line win over the config file
fn apply_overrides(config: &mut Config, args: &Args) {
    if args.insecure_skip_tls_verify {
        config.insecure_skip_tls_verify = true;
    }
    if let Some(path) = &args.log_file {
        config.log_file = Some(path.clone());
    }
}

/// Validate inputs, obtain a token, and export the aliases
async fn execute(args: Args, config: &Config) -> Result<(), AppError> {
    validate_segment("tenant name", &args.tenant_name)?;
    validate_segment("subscription id", &args.subscription_id)?;
    validate_segment("resource provider", &args.resource_provider)?;

    let credentials = Credentials::new(args.tenant_name, args.client_id, args.client_secret);
    let authenticator = ClientSecretAuthenticator::new(config, credentials)?;
    tracing::debug!("Using authority {}", authenticator.authority());

    let token = authenticator
        .obtain_access_token(&[MANAGEMENT_SCOPE])
        .await?;

    let client = ManagementClient::new(config)?;
    tracing::debug!("Using management endpoint {}", client.endpoint());

    export::export_resource_provider_aliases(
        &client,
        &token,
        &args.subscription_id,
        &args.resource_provider,
        &args.export_file,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use std::io::Write;

    const TENANT: &str = "contoso.onmicrosoft.com";
    const SUBSCRIPTION: &str = "00000000-1111-2222-3333-444444444444";

    fn test_args(export_file: PathBuf) -> Args {
        Args {
            tenant_name: TENANT.into(),
            client_id: "my-client".into(),
            client_secret: "s3cr3t".into(),
            subscription_id: SUBSCRIPTION.into(),
            resource_provider: "Microsoft.Web".into(),
            export_file,
            insecure_skip_tls_verify: false,
            config: None,
            log_file: None,
            verbose: false,
        }
    }

    fn test_config(identity: &MockServer, management: &MockServer) -> Config {
        Config {
            authority_host: format!("http://{}", identity.address()),
            management_endpoint: format!("http://{}", management.address()),
            ..Config::default()
        }
    }

    #[test]
    fn test_cli_flags_match_documented_names() {
        let args = Args::try_parse_from([
            "rpalias",
            "--tenantname",
            TENANT,
            "--clientid",
            "my-client",
            "--clientsecret",
            "s3cr3t",
            "--subscriptionid",
            SUBSCRIPTION,
            "--resourceprovider",
            "Microsoft.Web",
            "--exportfile",
            "/tmp/aliases.csv",
            "--insecure-skip-tls-verify",
            "--logfile",
            "/tmp/rpalias.log",
        ])
        .unwrap();

        assert_eq!(args.tenant_name, TENANT);
        assert_eq!(args.subscription_id, SUBSCRIPTION);
        assert_eq!(args.resource_provider, "Microsoft.Web");
        assert_eq!(args.export_file, PathBuf::from("/tmp/aliases.csv"));
        assert!(args.insecure_skip_tls_verify);
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/rpalias.log")));
        assert!(!args.verbose);
    }

    #[tokio::test]
    async fn test_full_export_flow() {
        let identity = MockServer::start();
        let token_mock = identity.mock(|when, then| {
            when.method(POST)
                .path(format!("/{TENANT}/oauth2/v2.0/token"))
                .body_includes("grant_type=client_credentials");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"flow-tok"}"#);
        });

        let management = MockServer::start();
        let api_mock = management.mock(|when, then| {
            when.method(GET)
                .path(format!("/subscriptions/{SUBSCRIPTION}/providers/Microsoft.Web"))
                .query_param("$expand", "resourceTypes/aliases")
                .header("authorization", "Bearer flow-tok");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"namespace":"Microsoft.Web","resourceTypes":[
                        {"resourceType":"sites","aliases":[
                            {"name":"Microsoft.Web/sites/httpsOnly","defaultPath":"properties.httpsOnly"},
                            {"name":"Microsoft.Web/sites/siteConfig.minTlsVersion","defaultPath":"properties.siteConfig.minTlsVersion"}
                        ]}
                    ]}"#,
                );
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.csv");

        execute(test_args(path.clone()), &test_config(&identity, &management))
            .await
            .unwrap();

        token_mock.assert_calls(1);
        api_mock.assert_calls(1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("name,defaultPath\n"));
        assert!(content.contains("Microsoft.Web/sites/httpsOnly,properties.httpsOnly\n"));
    }

    #[tokio::test]
    async fn test_auth_failure_skips_management_call() {
        let identity = MockServer::start();
        identity.mock(|when, then| {
            when.method(POST);
            then.status(400)
                .header("content-type", "application/json")
                .body(
                    r#"{"error":"unauthorized_client","error_description":"AADSTS700016: Application not found","correlation_id":"c0ffee"}"#,
                );
        });

        let management = MockServer::start();
        let api_mock = management.mock(|when, then| {
            when.method(GET);
            then.status(200).body(r#"{"resourceTypes":[]}"#);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.csv");

        let err = execute(test_args(path.clone()), &test_config(&identity, &management))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(api_mock.calls(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_input_skips_all_network_calls() {
        let identity = MockServer::start();
        let token_mock = identity.mock(|when, then| {
            when.method(POST);
            then.status(200).body(r#"{"access_token":"tok"}"#);
        });
        let management = MockServer::start();

        let dir = tempfile::tempdir().unwrap();
        let mut args = test_args(dir.path().join("aliases.csv"));
        args.resource_provider = "Microsoft.Web/sites".into();

        let err = execute(args, &test_config(&identity, &management))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 5);
        assert_eq!(token_mock.calls(), 0);
    }

    #[test]
    fn test_unreadable_config_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = test_args(dir.path().join("aliases.csv"));
        args.config = Some(dir.path().join("missing.toml"));

        let err = load_config(&args).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_config_file_points_at_endpoints() {
        let identity = MockServer::start();
        identity.mock(|when, then| {
            when.method(POST);
            then.status(200).body(r#"{"access_token":"cfg-tok"}"#);
        });
        let management = MockServer::start();
        let api_mock = management.mock(|when, then| {
            when.method(GET)
                .query_param("api-version", "2021-04-01")
                .header("authorization", "Bearer cfg-tok");
            then.status(200).body(r#"{"resourceTypes":[]}"#);
        });

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(file, "authority_host = \"http://{}\"", identity.address()).unwrap();
        writeln!(file, "management_endpoint = \"http://{}\"", management.address()).unwrap();
        writeln!(file, "api_version = \"2021-04-01\"").unwrap();

        let path = dir.path().join("aliases.csv");
        let mut args = test_args(path.clone());
        args.config = Some(config_path);

        let config = load_config(&args).unwrap();
        execute(args, &config).await.unwrap();

        api_mock.assert();
        assert_eq!(fs::read_to_string(&path).unwrap(), "name,defaultPath\n");
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "insecure_skip_tls_verify = false\nlog_file = \"/var/log/from-config.log\"\n",
        )
        .unwrap();

        let mut args = test_args(dir.path().join("aliases.csv"));
        args.config = Some(config_path.clone());

        let config = load_config(&args).unwrap();
        assert!(!config.insecure_skip_tls_verify);
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/from-config.log")));

        args.insecure_skip_tls_verify = true;
        args.log_file = Some(dir.path().join("from-cli.log"));

        let config = load_config(&args).unwrap();
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.log_file, Some(dir.path().join("from-cli.log")));
    }

    #[test]
    fn test_absent_flag_keeps_config_file_tls_setting() {
        let mut config = Config {
            insecure_skip_tls_verify: true,
            ..Config::default()
        };
        let args = test_args(PathBuf::from("aliases.csv"));

        apply_overrides(&mut config, &args);
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.log_file, None);
    }

    #[tokio::test]
    async fn test_log_file_records_auth_failure() {
        let identity = MockServer::start();
        identity.mock(|when, then| {
            when.method(POST);
            then.status(401)
                .header("content-type", "application/json")
                .body(
                    r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.","correlation_id":"c0ffee"}"#,
                );
        });
        let management = MockServer::start();

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("rpalias.log");
        let subscriber = logging_subscriber(false, Some(open_log_file(&log_path).unwrap()));

        let err = {
            let _guard = tracing::subscriber::set_default(subscriber);
            execute(
                test_args(dir.path().join("aliases.csv")),
                &test_config(&identity, &management),
            )
            .await
            .unwrap_err()
        };
        assert_eq!(err.exit_code(), 3);

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("Attempting to obtain an access token"));
        assert!(log.contains("Authentication failure"));
        assert!(log.contains("Error was: invalid_client"));
        assert!(log.contains("Error correlation_id was: c0ffee"));
        assert!(!log.contains('\x1b'));
        assert!(!log.contains("s3cr3t"));
    }

    #[test]
    fn test_unopenable_log_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_log_file(&dir.path().join("missing-dir").join("rpalias.log")).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
