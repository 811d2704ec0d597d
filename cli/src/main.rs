//! CLI entrypoint for Toolgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use toolgate_application::{Engine, RunRequest, TraceSink};
use toolgate_domain::{Domain, TerminationReason};
use toolgate_infrastructure::{
    ConfigLoader, JsonSchemaView, JsonlTraceLogger, OpenAiClient, OpenAiConfig, Settings,
    ToolRegistry, WorkspaceGuard,
};

#[derive(Parser, Debug)]
#[command(name = "toolgate", version, about = "Domain-gated tool-calling agent runner")]
struct Cli {
    /// The task for the model to carry out
    prompt: Option<String>,

    /// Domain to pre-activate (files, apps, system, project, git, web)
    #[arg(long)]
    domain: Option<String>,

    /// Step budget for the run
    #[arg(long)]
    steps: Option<usize>,

    /// Accept plain assistant text as the answer instead of requiring assistant.final
    #[arg(long)]
    no_require_final: bool,

    /// Workspace root (default: current directory)
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Allow path arguments outside the workspace root
    #[arg(long)]
    unsafe_paths: bool,

    /// Print the full run result as JSON
    #[arg(long)]
    json: bool,

    /// Write run events to a JSONL trace log
    #[arg(long, value_name = "PATH")]
    trace_log: Option<PathBuf>,

    /// Explicit config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Print configuration sources and the effective config, then exit
    #[arg(long)]
    show_config: bool,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Endpoint base URL override
    #[arg(long)]
    endpoint: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress informational output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::new("warn"),
        (false, 1) => EnvFilter::new("info"),
        (false, 2) => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // === Configuration ===
    let mut settings = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    apply_overrides(&mut settings, &cli);

    if cli.show_config {
        ConfigLoader::print_config_sources();
        println!();
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let Some(prompt) = cli.prompt.clone() else {
        bail!("A prompt is required (see --help).");
    };

    // === Dependency Injection ===
    let workspace = match &settings.safety.workspace {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let guard = WorkspaceGuard::new(&workspace, settings.safety.enforce)
        .with_context(|| format!("Invalid workspace root: {}", workspace.display()))?;
    if !guard.enforced() {
        warn!("path enforcement is disabled; tools may touch files outside the workspace");
    }

    let registry = Arc::new(
        ToolRegistry::with_builtin_providers(guard.root().to_path_buf())
            .context("Failed to assemble the tool catalog")?,
    );

    let Some(api_key) = settings.model.api_key() else {
        bail!(
            "No API key found. Set the {} environment variable.",
            settings.model.api_key_env
        );
    };
    let model = Arc::new(OpenAiClient::new(OpenAiConfig {
        base_url: settings.model.endpoint.clone(),
        model: settings.model.name.clone(),
        api_key,
        temperature: settings.model.temperature,
        timeout_secs: settings.model.timeout_secs,
    }));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current turn");
                cancel.cancel();
            }
        });
    }

    let mut engine = Engine::new(
        model,
        registry,
        Arc::new(guard),
        Arc::new(JsonSchemaView),
    )
    .with_cancellation(cancel);

    let trace_path = cli
        .trace_log
        .clone()
        .or_else(|| settings.trace.log_file.as_ref().map(PathBuf::from));
    if let Some(path) = trace_path
        && let Some(logger) = JsonlTraceLogger::new(&path)
    {
        info!(path = %logger.path().display(), "trace log enabled");
        engine = engine.with_trace_sink(Arc::new(logger) as Arc<dyn TraceSink>);
    }

    // === Run ===
    let mut request = RunRequest::new(prompt)
        .with_tool_max_steps(settings.run.steps)
        .require_final(settings.run.require_final);
    if let Some(name) = &settings.run.domain {
        let domain: Domain = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        request = request.with_domain_hint(domain);
    }

    let result = engine.run(request).await;

    for (index, step) in result.steps.iter().enumerate() {
        info!(
            "step {}: {} {}{}",
            index + 1,
            if step.ok { "ok    " } else { "failed" },
            step.name,
            if step.truncated { " (truncated)" } else { "" },
        );
    }
    info!(
        reason = result.terminated_reason.as_str(),
        steps = result.steps.len(),
        failed = result.failed_steps(),
        "run finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !result.final_text.is_empty() {
        println!("{}", result.final_text);
    }

    match result.terminated_reason {
        TerminationReason::ProviderFailed => {
            if let Some(error) = &result.provider_error {
                eprintln!("Provider failure: {error}");
            }
            std::process::exit(1);
        }
        TerminationReason::Cancelled => std::process::exit(130),
        _ => Ok(()),
    }
}

/// CLI flags override whatever the config files said.
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(model) = &cli.model {
        settings.model.name = model.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        settings.model.endpoint = endpoint.clone();
    }
    if let Some(steps) = cli.steps {
        settings.run.steps = steps;
    }
    if cli.no_require_final {
        settings.run.require_final = false;
    }
    if let Some(domain) = &cli.domain {
        settings.run.domain = Some(domain.clone());
    }
    if let Some(workspace) = &cli.workspace {
        settings.safety.workspace = Some(workspace.display().to_string());
    }
    if cli.unsafe_paths {
        settings.safety.enforce = false;
    }
}
