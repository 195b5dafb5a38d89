use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use forerun_bot::{Bot, TargetFilter};
use forerun_chain::TxFetcher;
use forerun_core::config::AppConfig;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forerunner", version, about = "Pending-transaction race bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watch/race loop until killed.
    Run {
        #[arg(short, long, default_value = "config/forerun.toml")]
        config: String,
    },
    /// Fetch one transaction and report whether it matches the target call.
    Probe {
        #[arg(short, long, default_value = "config/forerun.toml")]
        config: String,
        #[arg(long)]
        tx: String,
    },
    /// Dump the effective configuration as JSON.
    PrintConfig {
        #[arg(short, long, default_value = "config/forerun.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let bot = Bot::new(cfg).await?;
            bot.run().await?;
        }
        Commands::Probe { config, tx } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let provider = ProviderBuilder::new()
                .connect(&cfg.chain.rpc_ws)
                .await?
                .erased();
            let chain_id = provider.get_chain_id().await?;
            info!(chain_id, "connected");
            let fetcher = TxFetcher::new(provider, cfg.watch.tx_fetch_timeout_ms);
            let hash = B256::from_str(&tx).map_err(|_| anyhow!("invalid tx hash"))?;
            match fetcher.fetch(hash).await? {
                Some(tx) => {
                    let filter =
                        TargetFilter::new(&cfg.watch.target_signature, Address::ZERO);
                    println!("from: {}", tx.from);
                    println!("to: {:?}", tx.to);
                    println!(
                        "selector: 0x{}",
                        hex::encode(&tx.input[..tx.input.len().min(4)])
                    );
                    if filter.is_target(&tx) {
                        println!("matches target {}", cfg.watch.target_signature);
                    } else {
                        println!("does not match target {}", cfg.watch.target_signature);
                    }
                }
                None => println!("transaction not found"),
            }
        }
        Commands::PrintConfig { config } => {
            let cfg = AppConfig::load(&config)?;
            init_tracing(&cfg.observability.log_level);
            let json = serde_json::to_string_pretty(&cfg)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
