//! Tayori command-line client.
//!
//! Usage:
//!   # Follow the unread counter on the default endpoint
//!   cargo run -p tayori-cli -- watch
//!
//!   # Custom endpoint, store hydrated from a server snapshot
//!   cargo run -p tayori-cli -- watch --endpoint ws://push.internal:8082 --snapshot page.json
//!
//!   # Apply one reducer action offline and print the domain
//!   cargo run -p tayori-cli -- reduce --snapshot page.json explore/setWriter '{"list":[{"id":1}]}'

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tayori_client::{ActionRunner, ChannelConfig, ClientConfig, NotificationsSurface, OfflineService, WsConnector};
use tayori_store::domain::split_action_type;
use tayori_store::domains::Notifications;
use tayori_store::{Domain, StoreBuilder, StoreHandle};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "tayori")]
#[command(about = "Tayori client: realtime notifications and store tooling")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the push endpoint and log the unread counter
    Watch {
        /// RON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Push endpoint, overriding the config file
        #[arg(long)]
        endpoint: Option<String>,

        /// JSON server snapshot to hydrate the store from
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Apply one reducer action and print the resulting domain state
    Reduce {
        /// JSON server snapshot to hydrate the store from
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Action type, `<domain>/<action>`
        action_type: String,

        /// JSON payload
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "telemetry")]
    let _otel_guard = if tayori_telemetry::otel_enabled() {
        match tayori_telemetry::otel_layer("tayori") {
            Ok((otel_layer, guard)) => {
                registry.with(otel_layer).init();
                Some(guard)
            }
            Err(e) => {
                registry.init();
                tracing::warn!(error = %e, "OTel export disabled");
                None
            }
        }
    } else {
        registry.init();
        None
    };

    #[cfg(not(feature = "telemetry"))]
    registry.init();

    match Args::parse().command {
        Command::Watch { config, endpoint, snapshot } => watch(config, endpoint, snapshot).await,
        Command::Reduce { snapshot, action_type, payload } => reduce(snapshot, &action_type, payload),
    }
}

fn load_snapshot(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn store_builder(config: &ClientConfig, snapshot: Option<&Path>) -> Result<StoreBuilder> {
    let builder = StoreBuilder::new()
        .ordering(config.merge_ordering)
        .event_capacity(config.event_capacity)
        .with_builtin_domains();
    match snapshot {
        Some(path) => Ok(builder.hydrate(&load_snapshot(path)?)?),
        None => Ok(builder),
    }
}

async fn watch(config: Option<PathBuf>, endpoint: Option<String>, snapshot: Option<PathBuf>) -> Result<()> {
    let mut config = match config {
        Some(path) => ClientConfig::load(&path).with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = endpoint {
        config.push_endpoint = endpoint;
    }

    let store = store_builder(&config, snapshot.as_deref())?.spawn();
    let surface = NotificationsSurface::mount(
        Arc::new(WsConnector::new(config.connect_timeout())),
        ChannelConfig::from(&config),
        ActionRunner::new(store.clone()),
        Arc::new(OfflineService),
    );
    tracing::info!(endpoint = %config.push_endpoint, "watching notifications");

    follow(&store, &surface).await;

    tracing::info!("unmounting");
    surface.unmount().await;
    Ok(())
}

/// Log channel transitions and counter changes until Ctrl-C.
async fn follow(store: &StoreHandle, surface: &NotificationsSurface) {
    let mut state = surface.channel().watch_state();
    let mut events = store.subscribe();
    let mut last = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "ctrl-c handler failed");
                }
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                tracing::info!(state = ?current, "push channel");
            }
            event = events.recv() => match event {
                Ok(event) if event.touches(Notifications::NAME) => {
                    let Ok(counter) = store.read::<Notifications, _, _>(|n| n.group_count.clone()).await else {
                        break;
                    };
                    if last.as_ref() != Some(&counter) {
                        tracing::info!(count = counter.count, group = %counter.group, "unread");
                        last = Some(counter);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "store events lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

fn reduce(snapshot: Option<PathBuf>, action_type: &str, payload: Option<String>) -> Result<()> {
    let payload = match payload {
        Some(text) => serde_json::from_str(&text).context("parsing payload")?,
        None => Value::Null,
    };
    let (domain, _) = split_action_type(action_type)?;

    let mut store = store_builder(&ClientConfig::default(), snapshot.as_deref())?.into_store();
    store.dispatch(action_type, payload)?;

    println!("{}", serde_json::to_string_pretty(&store.snapshot(domain)?)?);
    Ok(())
}
