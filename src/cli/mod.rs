mod render;

pub use render::render_text;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::Settings;
use crate::services::{lookup_stop, Coordinator, HttpFetcher};
use crate::types::{Snapshot, SubscriptionList};

/// Chilean public data feeds in one snapshot
#[derive(Parser)]
#[command(name = "navaja")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (TOML); defaults to the platform config directory
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Comma-separated bus-stop codes, overriding the settings file
    #[arg(long, global = true, value_name = "LIST")]
    stops: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh periodically until interrupted (default)
    Watch {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a single refresh cycle and print the snapshot
    Once {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up arrivals for one stop, outside the subscription
    Lookup {
        /// Stop code (e.g., PA433)
        #[arg(value_name = "STOP_ID")]
        stop_id: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = Settings::load(self.config.as_deref()).context("loading settings")?;
        let subscription = match &self.stops {
            Some(raw) => SubscriptionList::parse(raw),
            None => settings.subscription(),
        };

        match self.command {
            None => watch(&settings, &subscription, false).await,
            Some(Commands::Watch { json }) => watch(&settings, &subscription, json).await,
            Some(Commands::Once { json }) => once(&settings, &subscription, json).await,
            Some(Commands::Lookup { stop_id }) => lookup(&settings, &stop_id).await,
        }
    }
}

async fn watch(
    settings: &Settings,
    subscription: &SubscriptionList,
    json: bool,
) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_settings(settings, subscription)?;

    let token = coordinator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            token.cancel();
        }
    });

    let mut print_error = None;
    coordinator
        .run(|_, snapshot| {
            if let Err(e) = print_snapshot(snapshot, json) {
                if print_error.is_none() {
                    print_error = Some(e);
                }
                coordinator.shutdown();
            }
        })
        .await;

    match print_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn once(
    settings: &Settings,
    subscription: &SubscriptionList,
    json: bool,
) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_settings(settings, subscription)?;
    coordinator.refresh().await?;
    print_snapshot(&coordinator.store().current(), json)
}

async fn lookup(settings: &Settings, stop_id: &str) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(settings.request_timeout())?;
    let now = chrono::Utc::now().with_timezone(&settings.reference_tz()?);
    let response = lookup_stop(&fetcher, &settings.endpoints.bus_stop, stop_id, &now).await;

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        bail!("lookup failed with status {}", response.status);
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}", render_text(snapshot));
    }
    Ok(())
}
