//! Sharewatch - network share change monitor with webhook notifications.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use sharewatch::config::{ConfigError, ConfigLoader};
use sharewatch::engine::Daemon;
use sharewatch::remote::{MountLister, ShareLister};
use sharewatch::store::{default_state_path, KnownStateStore};
use sharewatch::watch::ShareWatcher;
use sharewatch::webhook::{DiscordWebhook, LogSink, NotifySink};

#[derive(Parser)]
#[command(
    name = "sharewatch",
    about = "Monitor a network share and announce changes to a webhook",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured share and report changes.
    Run {
        /// Path to a config file (default: .sharewatch.toml, then
        /// ~/.config/sharewatch/config.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the share root from the config.
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config, root } => {
            if let Err(e) = run(config, root).await {
                tracing::error!(error = %e, "sharewatch exited with error");
                std::process::exit(1);
            }
        }
    }
}

async fn run(
    config_path: Option<PathBuf>,
    root_override: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = config_path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load()?;
    if let Some(root) = root_override {
        config.share.root = root;
    }

    let sink: Arc<dyn NotifySink> = match &config.webhook.url {
        Some(raw) => {
            let url = Url::parse(raw).map_err(ConfigError::from)?;
            Arc::new(DiscordWebhook::new(
                url,
                config.webhook.username.clone(),
                config.webhook.color,
            ))
        }
        None => {
            tracing::warn!("No webhook endpoint configured; notifications go to the log");
            Arc::new(LogSink)
        }
    };

    if config.share.username.is_some() || config.share.domain.is_some() {
        tracing::debug!("Share credentials configured; mount-based access does not use them");
    }

    let db_path = config.state_db.clone().unwrap_or_else(default_state_path);
    let store = Arc::new(KnownStateStore::open(&db_path).await?);
    let recovered = store.load().await?;
    tracing::info!(recovered, db = %db_path.display(), "Known state loaded");

    println!(
        "{}",
        format!("sharewatch: monitoring {}", config.share.root.display()).red()
    );

    let lister: Arc<dyn ShareLister> = Arc::new(MountLister::new(config.share.root.clone()));
    let (watcher, signals) = ShareWatcher::new(
        config.share.root.clone(),
        config.poll.watch_poll_interval(),
    )?;

    let daemon = Daemon::new(
        Arc::clone(&store),
        lister,
        sink,
        config.share.root.clone(),
        config.batch.size_cap,
    );
    daemon.initial_index().await;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received; shutting down");
                shutdown.cancel();
            }
        });
    }

    daemon
        .run(
            signals,
            config.poll.reconcile_interval(),
            config.batch.flush_interval(),
            shutdown,
        )
        .await;

    watcher.stop();
    store.close().await;
    Ok(())
}
