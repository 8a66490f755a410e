//! Tequmsa Relay — stand-alone update relay

use clap::Parser;
use tequmsa_core::{BindMode, RelayConfig};
use tequmsa_relay::start_relay;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tequmsa-relay", about = "In-memory JSON update relay")]
struct Cli {
    #[arg(short, long, default_value = "3080")]
    port: u16,
    #[arg(short, long, default_value = "lan")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tequmsa_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    start_relay(RelayConfig {
        port: cli.port,
        bind: BindMode::parse(&cli.bind),
    })
    .await
}
