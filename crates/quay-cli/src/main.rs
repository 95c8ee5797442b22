//! # quay-cli
//!
//! Operator command-line interface for Quayside nodes.
//!
//! ## Usage
//!
//! ```bash
//! # Node commands
//! quay node start peer0.json --root /var/quayside
//! quay node stop peer0.json
//! quay node logs peer0.json --tail 200 --follow
//! quay node validate peer0.json
//! quay node show peer0.json
//!
//! # Channel commands
//! quay channel list --admin 127.0.0.1:7053 --cert admin.pem --key admin-key.pem --ca tlsca.pem
//! quay channel join --admin 127.0.0.1:7053 --cert admin.pem --key admin-key.pem --ca tlsca.pem genesis.block
//! quay channel leave --admin 127.0.0.1:7053 --cert admin.pem --key admin-key.pem --ca tlsca.pem mychannel
//! ```
//!
//! Identity issuance and certificate renewal are not exposed here; they
//! require the external CA provider and run inside the provisioning
//! service.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod error;
mod output;

pub use error::CliError;
pub use output::Output;

/// Quayside CLI
#[derive(Parser, Debug)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Node process operations
    #[command(subcommand)]
    Node(commands::node::NodeCommand),
    /// Channel participation operations
    #[command(subcommand)]
    Channel(commands::channel::ChannelCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Node(cmd) => cmd.execute(cli.json).await,
        Commands::Channel(cmd) => cmd.execute(cli.json).await,
    };

    if let Err(e) = result {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}
