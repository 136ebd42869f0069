//! Roofing lead wizard driver.
//!
//! Resolves the tenant for a page URL and runs a wizard session fed by
//! JSON-line commands, printing every wizard event as a JSON line on stdout.
//! Logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use leadwizard_core::config::AppConfig;
use leadwizard_core::tenant::{
    ClientResolver, DirectorySource, ResolvedTenant, TenantConfig, TenantLoader,
};
use leadwizard_core::types::{Coordinate, FieldKey, FieldValue};
use leadwizard_wizard::events::ChannelSink;
use leadwizard_wizard::{AutoAdvancePolicy, Session, SessionHandle, Wizard};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "leadwizard")]
#[command(about = "Multi-step roofing lead capture wizard")]
#[command(version)]
struct Cli {
    /// Optional TOML/JSON/YAML config file
    #[arg(long, env = "LEADWIZARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding per-client tenant files (overrides config)
    #[arg(long, env = "LEADWIZARD__TENANTS__CONFIGS_DIR")]
    configs_dir: Option<PathBuf>,

    /// URL of the page hosting the wizard; selects the tenant
    #[arg(long, global = true, default_value = "http://localhost/")]
    page_url: Url,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tenant record the page URL resolves to
    Resolve,
    /// Run a wizard session from JSON-line commands (stdin by default)
    Run {
        #[arg(long)]
        script: Option<PathBuf>,
    },
}

/// One line of session input.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum ScriptCommand {
    Set { field: String, value: String },
    Clear { field: String },
    Pin { lat: String, lng: String },
    Slide { field: String, index: u8 },
    Next,
    Back,
    Wait { ms: u64 },
    Snapshot,
}

#[derive(Serialize)]
struct Line<'a, T: Serialize> {
    kind: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

fn print_line<T: Serialize>(kind: &str, body: &T) {
    match serde_json::to_string(&Line { kind, body }) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, kind, "Failed to serialize output line"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "leadwizard=info,leadwizard_wizard=info,leadwizard_core=info".into()
                }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(dir) = cli.configs_dir {
        config.tenants.configs_dir = dir;
    }

    info!(
        page_url = %cli.page_url,
        configs_dir = %config.tenants.configs_dir.display(),
        default_tenant = %config.tenants.default_tenant,
        auto_advance_ms = config.auto_advance.delay_ms,
        "Configuration loaded"
    );

    match cli.command {
        Command::Resolve => {
            let tenant = resolve_tenant(&config, &cli.page_url).await;
            print_line("tenant", &tenant);
            Ok(())
        }
        Command::Run { script } => run_session(config, cli.page_url, script).await,
    }
}

async fn resolve_tenant(config: &AppConfig, page_url: &Url) -> ResolvedTenant {
    let selection = ClientResolver::new(config.tenants.default_tenant.clone()).resolve(page_url);
    let loader = TenantLoader::new(
        DirectorySource::new(config.tenants.configs_dir.clone()),
        &config.tenants,
        &config.contact,
    );
    loader.load(&selection).await
}

async fn run_session(
    config: AppConfig,
    page_url: Url,
    script: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (sink, mut events) = ChannelSink::new();
    let wizard = Wizard::new(
        TenantConfig::builtin(&config.contact),
        AutoAdvancePolicy::from(&config.auto_advance),
    )
    .with_event_sink(Arc::new(sink));
    let (handle, session_task) = Session::spawn(wizard);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_line("event", &event);
        }
    });

    // Field entry runs on the built-in record while the tenant loads.
    let tenant_task = {
        let handle = handle.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let resolved = resolve_tenant(&config, &page_url).await;
            info!(origin = ?resolved.origin, tenant = %resolved.config.display_name(), "Tenant resolved");
            if let Err(e) = handle.apply_tenant(resolved.config).await {
                warn!(error = %e, "Session ended before tenant resolved");
            }
        })
    };

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match script {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    drive_script(&handle, input, tenant_task).await?;

    let snapshot = handle.snapshot().await?;
    print_line("snapshot", &snapshot);

    handle.shutdown().await?;
    drop(handle);
    session_task.await.context("session task")?;
    printer.await.context("event printer")?;
    Ok(())
}

/// Feed JSON-line commands into the session. `next` waits for the tenant so
/// a submission is never assembled from the built-in record by accident.
async fn drive_script<R: AsyncBufRead + Unpin>(
    handle: &SessionHandle,
    input: R,
    tenant_task: JoinHandle<()>,
) -> anyhow::Result<()> {
    let mut tenant_task = Some(tenant_task);
    let mut lines = input.lines();
    let mut number = 0usize;
    while let Some(line) = lines.next_line().await? {
        number += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command: ScriptCommand = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(line = number, error = %e, "Skipping unparseable command");
                continue;
            }
        };
        if matches!(command, ScriptCommand::Next) {
            if let Some(task) = tenant_task.take() {
                task.await.context("tenant resolution task")?;
            }
        }
        if let Err(e) = execute(handle, command).await {
            warn!(line = number, error = %e, "Command failed");
            print_line(
                "error",
                &serde_json::json!({ "line": number, "message": e.to_string() }),
            );
        }
    }

    if let Some(task) = tenant_task {
        task.await.context("tenant resolution task")?;
    }
    Ok(())
}

async fn execute(handle: &SessionHandle, command: ScriptCommand) -> anyhow::Result<()> {
    match command {
        ScriptCommand::Set { field, value } => {
            let key: FieldKey = field.parse()?;
            handle.set_field(key, FieldValue::label(value)).await?;
        }
        ScriptCommand::Clear { field } => {
            let key: FieldKey = field.parse()?;
            handle.set_field(key, FieldValue::Unset).await?;
        }
        ScriptCommand::Pin { lat, lng } => {
            handle.pin_location(Coordinate::parse(&lat, &lng)?).await?;
        }
        ScriptCommand::Slide { field, index } => {
            let key: FieldKey = field.parse()?;
            handle.set_scale(key, index).await?;
        }
        ScriptCommand::Next => {
            handle.advance().await?;
        }
        ScriptCommand::Back => {
            handle.retreat().await?;
        }
        ScriptCommand::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        ScriptCommand::Snapshot => {
            print_line("snapshot", &handle.snapshot().await?);
        }
    }
    Ok(())
}
