//! Channel participation commands

use crate::{output::Output, CliError};
use bytes::Bytes;
use clap::{Args, Subcommand};
use quay_channel::{ChannelClient, TlsIdentity};
use std::path::PathBuf;

/// Connection arguments shared by every channel command
#[derive(Debug, Args)]
pub struct ChannelArgs {
    /// Admin endpoint as host:port
    #[arg(long)]
    admin: String,

    /// Admin client certificate, PEM file
    #[arg(long)]
    cert: PathBuf,

    /// Admin client private key, PEM file
    #[arg(long)]
    key: PathBuf,

    /// CA certificate that signed the node's server certificate, PEM file
    #[arg(long)]
    ca: PathBuf,
}

impl ChannelArgs {
    fn client(&self) -> Result<ChannelClient, CliError> {
        let identity = TlsIdentity {
            client_cert_pem: std::fs::read_to_string(&self.cert)?,
            client_key_pem: std::fs::read_to_string(&self.key)?,
            server_ca_pem: std::fs::read_to_string(&self.ca)?,
        };
        Ok(ChannelClient::connect(&self.admin, identity))
    }
}

/// Channel subcommands
#[derive(Debug, Subcommand)]
pub enum ChannelCommand {
    /// List channels the node participates in
    List {
        #[command(flatten)]
        args: ChannelArgs,
    },
    /// Show the height and chain tip of one channel
    Info {
        #[command(flatten)]
        args: ChannelArgs,
        /// Channel id
        channel: String,
    },
    /// Join the node to a channel from a genesis or config block
    Join {
        #[command(flatten)]
        args: ChannelArgs,
        /// Path to the block file
        block: PathBuf,
    },
    /// Remove the node from a channel
    Leave {
        #[command(flatten)]
        args: ChannelArgs,
        /// Channel id
        channel: String,
    },
}

impl ChannelCommand {
    pub async fn execute(self, json: bool) -> Result<(), CliError> {
        match self {
            ChannelCommand::List { args } => list(&args, json).await,
            ChannelCommand::Info { args, channel } => info(&args, &channel, json).await,
            ChannelCommand::Join { args, block } => join(&args, &block, json).await,
            ChannelCommand::Leave { args, channel } => leave(&args, &channel, json).await,
        }
    }
}

async fn list(args: &ChannelArgs, json: bool) -> Result<(), CliError> {
    let channels = args.client()?.list().await?;

    let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
    Output::new(json)
        .field_value("channels", serde_json::to_value(&channels)?)
        .message(&if names.is_empty() {
            "No channels".to_string()
        } else {
            names.join("\n")
        })
        .print();
    Ok(())
}

async fn info(args: &ChannelArgs, channel: &str, json: bool) -> Result<(), CliError> {
    let info = args.client()?.info(channel).await?;

    Output::new(json)
        .field("name", &info.name)
        .field_u64("height", info.height)
        .field("block_hash", &info.block_hash)
        .field("status", &info.status)
        .message(&format!(
            "Channel: {}\nHeight:  {}\nTip:     {}",
            info.name, info.height, info.block_hash
        ))
        .print();
    Ok(())
}

async fn join(args: &ChannelArgs, block: &PathBuf, json: bool) -> Result<(), CliError> {
    let block_bytes = Bytes::from(std::fs::read(block)?);
    let info = args.client()?.join(block_bytes).await?;

    Output::new(json)
        .field("name", &info.name)
        .field_u64("height", info.height)
        .field("status", "joined")
        .message(&format!("Joined {} at height {}", info.name, info.height))
        .print();
    Ok(())
}

async fn leave(args: &ChannelArgs, channel: &str, json: bool) -> Result<(), CliError> {
    args.client()?.leave(channel).await?;

    Output::new(json)
        .field("name", channel)
        .field("status", "left")
        .message(&format!("Left {channel}"))
        .print();
    Ok(())
}
