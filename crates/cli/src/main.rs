use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    clap::{Parser, Subcommand},
    mjwrap_config::{RelayConfig, Severity},
    mjwrap_relay::{
        DisabledSceneSink, EventDispatcher, HttpSceneForwarder, RequestRegistry, SceneSink,
    },
    secrecy::ExposeSecret,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "mjwrap", about = "mjwrap: Discord image bot event relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (skips discovery in ./ and ~/.config/mjwrap/).
    #[arg(long, short, global = true, env = "MJWRAP_CONFIG")]
    config: Option<PathBuf>,

    /// Serve Prometheus metrics on this address.
    #[cfg(feature = "prometheus")]
    #[arg(long, global = true, env = "MJWRAP_METRICS_ADDR")]
    metrics_addr: Option<std::net::SocketAddr>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and relay events (default).
    Run,
    /// Validate the configuration and exit.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RelayConfig> {
    let mut config = match &cli.config {
        Some(path) => mjwrap_config::load_config(path)?,
        None => mjwrap_config::discover_and_load(),
    };
    mjwrap_config::apply_env_overrides(&mut config);
    Ok(config)
}

/// Log every diagnostic and fail if any of them is an error.
fn check_config(config: &RelayConfig) -> anyhow::Result<()> {
    let report = mjwrap_config::validate(config);
    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(path = diagnostic.path, "{}", diagnostic.message),
            Severity::Warning => warn!(path = diagnostic.path, "{}", diagnostic.message),
        }
    }
    if report.has_errors() {
        anyhow::bail!(
            "configuration has {} error(s)",
            report.count(Severity::Error)
        );
    }
    Ok(())
}

fn scene_sink(config: &RelayConfig) -> anyhow::Result<Arc<dyn SceneSink>> {
    match config.callback.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let timeout = Duration::from_secs(config.callback.timeout_secs);
            info!(url, timeout_secs = config.callback.timeout_secs, "scene callback enabled");
            Ok(Arc::new(HttpSceneForwarder::new(url, timeout)?))
        },
        _ => {
            warn!("no callback url configured, scene forwarding disabled");
            Ok(Arc::new(DisabledSceneSink))
        },
    }
}

#[cfg(feature = "prometheus")]
fn install_metrics_exporter(cli: &Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "prometheus metrics listening");
    }
    Ok(())
}

async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let registry = Arc::new(RequestRegistry::new(config.requests.channel_capacity));
    let dispatcher = Arc::new(EventDispatcher::new(
        config.discord.channel_id.trim(),
        registry,
        scene_sink(&config)?,
    ));

    let mut client =
        mjwrap_discord::connect(config.discord.token.expose_secret(), dispatcher).await?;
    let shard_manager = Arc::clone(&client.shard_manager);

    tokio::select! {
        result = client.start() => {
            result?;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
        },
    }

    info!("mjwrap stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "mjwrap starting");

    #[cfg(feature = "prometheus")]
    install_metrics_exporter(&cli)?;

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => {
            check_config(&config)?;
            run(config).await
        },
        Some(Commands::Check) => {
            check_config(&config)?;
            info!(channel_id = %config.discord.channel_id, "configuration ok");
            Ok(())
        },
    }
}
