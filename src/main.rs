use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use touch_origin::{Config, Replayer, Scenario};

#[derive(Parser, Debug)]
#[command(name = "touch-origin")]
#[command(about = "Classify pointer input as touch or mouse and inspect the result")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "touch-origin.toml")]
    config: PathBuf,

    /// Log level (overrides the configuration file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a TOML scenario of timed input events and print the classified events
    Replay {
        /// Scenario file
        scenario: PathBuf,

        /// Wait out the scenario timings on the wall clock instead of a virtual clock
        #[arg(long)]
        realtime: bool,
    },
    /// Print the effective configuration
    Capabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(Config::load(&args.config)?);

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, &config.logging.format)?;

    info!("touch-origin v{}", env!("CARGO_PKG_VERSION"));
    if args.config.exists() {
        info!("Configuration loaded from {:?}", args.config);
    } else {
        warn!("{:?} not found, using defaults", args.config);
    }

    match args.command {
        Command::Replay { scenario, realtime } => {
            let scenario = Scenario::load(&scenario)?;
            let replayer = Replayer::new(Arc::clone(&config));
            let report = if realtime {
                replayer.run_realtime(&scenario).await?
            } else {
                replayer.run(&scenario)?
            };
            println!("{}", report);
        }
        Command::Capabilities => {
            println!("capabilities: {}", config.capabilities);
            println!("degraded:     {}", config.capabilities.is_degraded());
            println!("decay:        {}ms", config.classifier.decay_ms);
            println!("targets:      {}", config.classifier.target_types.join(", "));
            println!(
                "prefixes:     {} / {}",
                config.classifier.touch_prefix, config.classifier.mouse_prefix
            );
        }
    }

    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
