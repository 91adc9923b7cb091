//! Beacon server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite issue store, wires the in-process backbone, spawns the dedup
//! engine and alert evaluator, and serves the JSON API over HTTP.
//!
//! Any dependency that cannot be brought up at boot is fatal: the process
//! exits instead of limping along.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use beacon_api::{AppState, ServerConfig, auth::TokenMap};
use beacon_bus::MemoryBus;
use beacon_core::bus::{ISSUE_UPDATES, RAW_EVENTS, Subscriber as _};
use beacon_engine::{
  AlertConfig, AlertEvaluator, DedupConfig, DedupEngine, TracingNotifier,
};
use beacon_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Beacon error-tracking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BEACON"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the issue store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;
  let store = Arc::new(store);

  // Backbone and consumer loops.
  let bus = MemoryBus::new(server_cfg.partitions);
  let (shutdown_tx, shutdown_rx) = watch::channel(false);

  let dedup_cfg = DedupConfig::default();
  let raw_consumer = bus
    .subscribe(RAW_EVENTS, &dedup_cfg.group)
    .await
    .context("failed to subscribe to raw-events")?;
  let dedup = DedupEngine::new(
    Arc::clone(&store),
    Arc::new(bus.clone()),
    raw_consumer,
    dedup_cfg,
  );
  let dedup_task = tokio::spawn(dedup.run(shutdown_rx.clone()));

  let alert_cfg = AlertConfig::default();
  let update_consumer = bus
    .subscribe(ISSUE_UPDATES, &alert_cfg.group)
    .await
    .context("failed to subscribe to issue-updates")?;
  let evaluator = AlertEvaluator::new(
    Arc::clone(&store),
    update_consumer,
    Arc::new(TracingNotifier),
    alert_cfg,
  );
  let alert_task = tokio::spawn(evaluator.run(shutdown_rx));

  // HTTP surface.
  let state = AppState {
    store,
    publisher: Arc::new(bus),
    identity: Arc::new(TokenMap::new(server_cfg.tokens.clone())),
  };
  let app = beacon_api::router(state);

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      tracing::info!("shutdown signal received");
    })
    .await
    .context("server error")?;

  // Let in-flight messages finish and offsets commit before exit.
  let _ = shutdown_tx.send(true);
  dedup_task.await.context("dedup engine panicked")??;
  alert_task.await.context("alert evaluator panicked")??;

  Ok(())
}
