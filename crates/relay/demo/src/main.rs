//! Relay demo
//!
//! Spawns a router, registers one producer and a set of mailbox sinks, routes
//! the producer to every sink, sends a batch of messages and prints what the
//! router ended up with.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use relay_router::{Router, RouterConfig};
use relay_types::ChannelComponent;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Relay demo CLI
#[derive(Parser)]
#[command(name = "relay-demo")]
#[command(about = "Route messages from one producer to a set of mailbox sinks", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<String>,

    /// Number of sink components
    #[arg(short, long, default_value_t = 3)]
    sinks: usize,

    /// Number of messages to send
    #[arg(short, long, default_value_t = 5)]
    messages: usize,

    /// Log level, overriding the configured one
    #[arg(long, env = "RELAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "RELAY_LOG_JSON")]
    json: bool,

    /// Format for the route listing and metrics
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RouterConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, cli.json || config.logging.json);

    let (router, task) = Router::<String>::spawn(&config)?;

    let (producer, _producer_inbox) = ChannelComponent::<String>::new(1);
    let producer_id = router.register(&producer)?.await?;

    let mut sinks = Vec::with_capacity(cli.sinks);
    for _ in 0..cli.sinks {
        let (sink, inbox) = ChannelComponent::<String>::new(cli.messages.max(1));
        let id = router.register(&sink)?.await?;
        router.add_route(producer_id, id)?.await?;
        sinks.push((id, sink, inbox));
    }

    for n in 0..cli.messages {
        router
            .send(producer_id, format!("message {n}"))
            .with_context(|| format!("submitting message {n}"))?;
    }

    for (id, _, inbox) in sinks.iter_mut() {
        for _ in 0..cli.messages {
            match tokio::time::timeout(RECEIVE_TIMEOUT, inbox.recv()).await {
                Ok(Some(message)) => info!(sink = %id, message = %message, "Received"),
                Ok(None) => break,
                Err(_) => {
                    warn!(sink = %id, "Timed out waiting for delivery");
                    break;
                }
            }
        }
    }

    let snapshot = router.list_routes()?.await?;

    drop(router);
    let metrics = task.await.context("router consumer loop panicked")?;

    match cli.format {
        OutputFormat::Text => {
            print!("{snapshot}");
            println!("{metrics:#?}");
        }
        OutputFormat::Json => {
            let report = serde_json::json!({
                "routes": snapshot,
                "metrics": metrics,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
