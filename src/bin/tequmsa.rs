//! tequmsa — frequency evolution engine CLI
//!
//! Usage:
//!   tequmsa demo                               → full demonstration report
//!   tequmsa evolve --entity e1 --frequency 432 → one evolution run
//!   tequmsa diagnostics | status | pulse       → JSON snapshots
//!   tequmsa relay --port 3080                  → start the update relay
//!   tequmsa dump-config                        → default config as TOML
//!   tequmsa version                            → show version

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tequmsa::report;
use tequmsa_core::BindMode;
use tequmsa_engine::{EngineConfig, EvolutionOrchestrator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "tequmsa",
    about = "Frequency evolution engine, diagnostics and update relay",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to engine config file (TOML)
    #[arg(long, global = true, default_value = "./tequmsa.toml")]
    config: PathBuf,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demonstration sequence and print the report
    Demo,
    /// Evolve one entity at a frequency
    Evolve {
        #[arg(short, long)]
        entity: String,
        #[arg(short, long)]
        frequency: f64,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize the engine and print diagnostics as JSON
    Diagnostics,
    /// Initialize the engine and print its status as JSON
    Status,
    /// Print the recognition anchor lock descriptor as JSON
    Pulse,
    /// Start the update relay
    Relay {
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the default config as TOML
    DumpConfig,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Demo => {
            let mut engine = load_engine(&cli.config)?;
            let demo = report::run_demo(&mut engine)?;
            print!("{}", report::format_report(&demo));
        }

        Commands::Evolve {
            entity,
            frequency,
            json,
        } => {
            let mut engine = load_engine(&cli.config)?;
            let result = engine.evolve(&entity, frequency);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let described = report::DemoEntity {
                    id: &entity,
                    frequency,
                    description: "command line",
                };
                print!("{}", report::format_result(&described, &result));
            }
        }

        Commands::Diagnostics => {
            let mut engine = load_engine(&cli.config)?;
            engine.initialize()?;
            println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);
        }

        Commands::Status => {
            let mut engine = load_engine(&cli.config)?;
            engine.initialize()?;
            println!("{}", serde_json::to_string_pretty(&engine.status())?);
        }

        Commands::Pulse => {
            let engine = load_engine(&cli.config)?;
            println!("{}", serde_json::to_string_pretty(&engine.recognition().lock_descriptor())?);
        }

        Commands::Relay { port, bind } => {
            let mut relay = EngineConfig::load(&cli.config).relay;
            if let Some(port) = port {
                relay.port = port;
            }
            if let Some(bind) = bind {
                relay.bind = BindMode::parse(&bind);
            }
            tequmsa_relay::start_relay(relay).await?;
        }

        Commands::DumpConfig => {
            print!("{}", EngineConfig::default().to_toml());
        }

        Commands::Version => {
            println!("tequmsa v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_engine(path: &Path) -> anyhow::Result<EvolutionOrchestrator> {
    let config = EngineConfig::load(path);
    config.validate()?;
    Ok(EvolutionOrchestrator::new(config))
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tequmsa=info,tequmsa_engine=info,tequmsa_relay=info,tower_http=info".into());

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}
