//! OS2mo → OS2rollekatalog synchronization runner.
//!
//! Reads the organisation from OS2mo, builds the role catalog payload and
//! POSTs it in one request. Configuration comes from a TOML file when
//! `--config` is given and from the `MOX_ROLLE_*` environment variables
//! otherwise.

mod logging;
mod rotating_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use rollekatalog_sync_core::config::AppConfig;
use rollekatalog_sync_core::SyncEngine;

/// Exit status for every failed run.
const EXIT_SYNC_FAILED: u8 = 3;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Export the OS2mo organisation to OS2rollekatalog.
#[derive(Parser, Debug)]
#[command(
    name = "os2rollekatalog-sync",
    version,
    about = "Export org units and employees from OS2mo to OS2rollekatalog"
)]
struct Cli {
    /// Path to a TOML configuration file. Without it, MOX_ROLLE_* environment
    /// variables are used.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Build the payload and print it instead of sending it.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and exit.
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Validate) = cli.command {
        let result = cmd_validate(cli.config.as_deref());
        if let Err(e) = &result {
            eprintln!("Error: {:#}", e);
        }
        return ExitCode::from(exit_status(&result));
    }

    let from_file = cli.config.is_some();
    let mut config = match read_config(cli.config.as_deref(), cli.log_level.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_SYNC_FAILED);
        }
    };

    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_SYNC_FAILED);
        }
    };

    let result = match prepare_config(&mut config, from_file) {
        Ok(()) => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                os2mo = %config.os2mo.url,
                rollekatalog = %config.rollekatalog.url,
                dry_run = cli.dry_run,
                "starting os2rollekatalog-sync"
            );
            run(config, cli.dry_run).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!("sync failed: {:#}", e);
    }
    ExitCode::from(exit_status(&result))
}

fn exit_status<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => EXIT_SYNC_FAILED,
    }
}

async fn run(config: AppConfig, dry_run: bool) -> Result<()> {
    let engine = SyncEngine::from_config(config).context("failed to create clients")?;

    if dry_run {
        let (payload, report) = engine.dry_run().await.context("failed to build payload")?;
        let json = serde_json::to_string_pretty(&payload).context("failed to serialize payload")?;
        println!("{}", json);
        info!(
            org_units = report.org_units,
            users = report.users,
            warnings = report.warnings.len(),
            "dry run complete, nothing sent"
        );
        return Ok(());
    }

    let report = engine.run().await.context("synchronization failed")?;
    if !report.warnings.is_empty() {
        warn!(count = report.warnings.len(), "sync finished with data warnings");
    }
    info!(
        status = ?report.sink_status,
        org_units = report.org_units,
        users = report.users,
        "success"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Parse the configuration source. Secrets and validation are handled by
/// [`prepare_config`] once logging is up.
fn read_config(path: Option<&Path>, log_level: Option<&str>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            AppConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None => AppConfig::from_env().context("failed to read environment configuration")?,
    };
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }
    Ok(config)
}

fn prepare_config(config: &mut AppConfig, from_file: bool) -> Result<()> {
    if from_file {
        config
            .resolve_env_vars()
            .context("failed to resolve environment variables")?;
    }
    config.validate().context("invalid configuration")?;
    Ok(())
}

fn cmd_validate(path: Option<&Path>) -> Result<()> {
    let (config, source) = match path {
        Some(path) => (
            AppConfig::load_from_file(path).context("failed to parse configuration")?,
            path.display().to_string(),
        ),
        None => (
            AppConfig::from_env().context("failed to read environment configuration")?,
            "environment".to_string(),
        ),
    };
    println!("Validating configuration: {}", source);
    println!();
    println!("  [OK] Configuration structure is valid");

    let mut config = config;
    if path.is_some() {
        config
            .resolve_env_vars()
            .context("failed to resolve environment variables")?;
        println!("  [OK] Environment variable references processed");
    }

    if let Err(e) = config.validate() {
        println!("  [FAIL] Validation error: {}", e);
        anyhow::bail!("configuration validation failed");
    }
    println!("  [OK] All required fields are valid");

    let set_or_not = |v: &Option<String>| if v.is_some() { "set" } else { "NOT SET" };
    println!();
    println!("Configuration summary:");
    println!("  OS2mo URL          : {}", config.os2mo.url);
    println!("  OS2mo token        : {}", set_or_not(&config.os2mo.api_key));
    println!("  Rollekatalog URL   : {}", config.rollekatalog.url);
    println!("  Rollekatalog key   : {}", set_or_not(&config.rollekatalog.api_key));
    println!(
        "  TLS verification   : {}",
        if config.rollekatalog.insecure_skip_tls_verify {
            "DISABLED"
        } else {
            "on"
        }
    );
    println!("  Mapping file       : {}", config.identity.mapping_file.display());
    println!("  Directory system   : {}", config.identity.ad_system_name);
    println!("  Payload format     : {:?}", config.sync.payload_format);
    println!("  Log file           : {}", config.logging.file.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "os2rollekatalog-sync",
            "--config",
            "/etc/rolle.toml",
            "--log-level",
            "info",
            "--dry-run",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/rolle.toml")));
        assert_eq!(cli.log_level.as_deref(), Some("info"));
        assert!(cli.dry_run);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from(["os2rollekatalog-sync", "validate", "-c", "x.toml"]);
        assert!(matches!(cli.command, Some(Commands::Validate)));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(())), 0);
        assert_eq!(exit_status::<()>(&Err(anyhow::anyhow!("boom"))), 3);
    }

    #[test]
    fn test_read_and_prepare_config_with_level_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[os2mo]
url = "https://os2mo.example.com"
api_key_env = "ROLLE_CLI_TEST_MO_TOKEN"

[rollekatalog]
url = "https://rollekatalog.example.com/api/organisation/v3"
api_key_env = "ROLLE_CLI_TEST_RK_KEY"

[identity]
mapping_file = "/tmp/mapping.csv"
"#,
        )
        .unwrap();
        std::env::set_var("ROLLE_CLI_TEST_MO_TOKEN", "mo");
        std::env::set_var("ROLLE_CLI_TEST_RK_KEY", "rk");

        let mut config = read_config(Some(&path), Some("warn")).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.os2mo.api_key.is_none());

        prepare_config(&mut config, true).unwrap();
        assert_eq!(config.os2mo.api_key.as_deref(), Some("mo"));
    }

    #[test]
    fn test_read_config_missing_file() {
        let err = read_config(Some(Path::new("/nonexistent/config.toml")), None).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load configuration file"));
    }

    #[test]
    fn test_prepare_config_reports_validation_failure() {
        let mut config = sync_config("http://127.0.0.1:1".into(), String::new(), PathBuf::from("m.csv"));
        let err = prepare_config(&mut config, false).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid configuration"));
    }

    #[test]
    fn test_validate_reports_missing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[os2mo]
url = "https://os2mo.example.com"
api_key_env = "ROLLE_CLI_TEST_UNSET_TOKEN"

[rollekatalog]
url = "https://rollekatalog.example.com/api/organisation/v3"
api_key_env = "ROLLE_CLI_TEST_UNSET_KEY"

[identity]
mapping_file = "/tmp/mapping.csv"
"#,
        )
        .unwrap();
        std::env::remove_var("ROLLE_CLI_TEST_UNSET_TOKEN");
        std::env::remove_var("ROLLE_CLI_TEST_UNSET_KEY");

        assert!(cmd_validate(Some(&path)).is_err());
    }

    // =======================================================================
    // Full runs against in-process servers
    // =======================================================================

    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use rollekatalog_sync_core::config::{
        HttpConfig, IdentityConfig, LoggingConfig, Os2moConfig, OutputConfig, RollekatalogConfig,
        SyncConfig,
    };
    use serde_json::{json, Value};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records the message of every event.
    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<String>>>);

    impl Messages {
        fn contains(&self, message: &str) -> bool {
            self.0.lock().unwrap().iter().any(|m| m == message)
        }
    }

    struct MessageVisitor(Option<String>);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Messages {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    async fn empty_page() -> Json<Value> {
        Json(json!({"items": [], "offset": 0, "total": 0}))
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// An empty OS2mo and a role catalog answering `status`.
    async fn start_servers(status: StatusCode) -> (String, String) {
        let mo = Router::new()
            .route("/service/o/org/ou/", get(empty_page))
            .route("/service/o/org/e/", get(empty_page));
        let rk = Router::new().route(
            "/api/organisation/v3",
            post(move || async move { (status, "import result") }),
        );
        let rk_url = format!("{}/api/organisation/v3", serve(rk).await);
        (serve(mo).await, rk_url)
    }

    fn sync_config(mo_url: String, rk_url: String, mapping_file: PathBuf) -> AppConfig {
        AppConfig {
            os2mo: Os2moConfig {
                url: mo_url,
                api_key_env: "UNUSED".into(),
                organisation_uuid: Some("org".into()),
                page_size: 100,
                api_key: Some("mo-token".into()),
            },
            rollekatalog: RollekatalogConfig {
                url: rk_url,
                api_key_env: "UNUSED".into(),
                insecure_skip_tls_verify: false,
                api_key: Some("rk-key".into()),
            },
            identity: IdentityConfig {
                mapping_file,
                ad_system_name: "Active Directory".into(),
            },
            logging: LoggingConfig::default(),
            http: HttpConfig {
                timeout_secs: Some(10),
            },
            sync: SyncConfig::default(),
            output: OutputConfig::default(),
        }
    }

    async fn run_against(status: StatusCode) -> (Result<()>, Messages) {
        let dir = tempfile::tempdir().unwrap();
        let mapping = dir.path().join("mapping.csv");
        std::fs::write(&mapping, "mo_uuid;ad_guid\n").unwrap();
        let (mo_url, rk_url) = start_servers(status).await;

        let messages = Messages::default();
        let subscriber = tracing_subscriber::registry().with(messages.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        let result = run(sync_config(mo_url, rk_url, mapping), false).await;
        (result, messages)
    }

    #[tokio::test]
    async fn test_sink_error_exits_3_without_success_line() {
        let (result, messages) = run_against(StatusCode::INTERNAL_SERVER_ERROR).await;

        assert_eq!(exit_status(&result), 3);
        let chain = format!("{:#}", result.unwrap_err());
        assert!(chain.contains("HTTP 500"), "unexpected error: {}", chain);
        assert!(messages.contains("OS2rollekatalog rejected the payload"));
        assert!(!messages.contains("success"));
    }

    #[tokio::test]
    async fn test_accepted_payload_logs_success() {
        let (result, messages) = run_against(StatusCode::OK).await;

        assert_eq!(exit_status(&result), 0);
        assert!(messages.contains("success"));
    }
}
