//! Node process commands

use crate::{output::Output, CliError};
use clap::Subcommand;
use quay_lifecycle::{build_launch_plan, default_image, BinaryResolver, DirBinaryResolver};
use quay_material::NodeDirs;
use quay_supervise::{ContainerSupervisor, ExecRunner, ServiceSupervisor, Supervisor};
use quay_types::{DeployMode, NodeDescriptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Node subcommands
#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Start a node from its descriptor file
    Start {
        /// Path to the descriptor JSON file
        descriptor: PathBuf,
        /// Material root directory
        #[arg(long, default_value = "/var/quayside")]
        root: PathBuf,
        /// Node binary cache root (service mode)
        #[arg(long, default_value = "/opt/quayside/bin")]
        bin_root: PathBuf,
    },
    /// Stop a node
    Stop {
        /// Path to the descriptor JSON file
        descriptor: PathBuf,
        /// Material root directory
        #[arg(long, default_value = "/var/quayside")]
        root: PathBuf,
        /// Node binary cache root (service mode)
        #[arg(long, default_value = "/opt/quayside/bin")]
        bin_root: PathBuf,
    },
    /// Tail a node's logs
    Logs {
        /// Path to the descriptor JSON file
        descriptor: PathBuf,
        /// Material root directory
        #[arg(long, default_value = "/var/quayside")]
        root: PathBuf,
        /// Node binary cache root (service mode)
        #[arg(long, default_value = "/opt/quayside/bin")]
        bin_root: PathBuf,
        /// Number of trailing lines to show
        #[arg(long, default_value_t = 100)]
        tail: usize,
        /// Keep following appended lines
        #[arg(long)]
        follow: bool,
    },
    /// Validate a descriptor file
    Validate {
        /// Path to the descriptor JSON file
        descriptor: PathBuf,
    },
    /// Show a descriptor
    Show {
        /// Path to the descriptor JSON file
        descriptor: PathBuf,
    },
}

impl NodeCommand {
    pub async fn execute(self, json: bool) -> Result<(), CliError> {
        match self {
            NodeCommand::Start {
                descriptor,
                root,
                bin_root,
            } => start(&descriptor, &root, &bin_root, json).await,
            NodeCommand::Stop {
                descriptor,
                root,
                bin_root,
            } => stop(&descriptor, &root, &bin_root, json).await,
            NodeCommand::Logs {
                descriptor,
                root,
                bin_root,
                tail,
                follow,
            } => logs(&descriptor, &root, &bin_root, tail, follow).await,
            NodeCommand::Validate { descriptor } => validate(&descriptor, json),
            NodeCommand::Show { descriptor } => show(&descriptor, json),
        }
    }
}

pub(crate) fn load_descriptor(path: &Path) -> Result<NodeDescriptor, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Descriptor(e.to_string()))
}

async fn supervisor(
    descriptor: &NodeDescriptor,
    root: &Path,
    bin_root: &Path,
) -> Result<Box<dyn Supervisor>, CliError> {
    let mode = descriptor
        .mode()
        .map_err(|_| CliError::Mode(descriptor.base().mode.clone()))?;
    let dirs = NodeDirs::new(root, descriptor.kind(), &descriptor.slug());
    let runner = Arc::new(ExecRunner::new());

    Ok(match mode {
        DeployMode::Service => {
            let resolver = DirBinaryResolver::new(bin_root);
            let binary = resolver
                .binary_path(descriptor.kind(), &descriptor.base().version)
                .await?;
            let plan = build_launch_plan(descriptor, &dirs, mode, Some(binary), None);
            Box::new(ServiceSupervisor::new(plan, runner))
        }
        DeployMode::Container => {
            let plan = build_launch_plan(descriptor, &dirs, mode, None, Some(default_image(descriptor)));
            Box::new(ContainerSupervisor::new(plan, runner))
        }
    })
}

async fn start(path: &Path, root: &Path, bin_root: &Path, json: bool) -> Result<(), CliError> {
    let descriptor = load_descriptor(path)?;
    supervisor(&descriptor, root, bin_root).await?.start().await?;

    Output::new(json)
        .field("node", &descriptor.slug())
        .field("status", "started")
        .message(&format!("Started {}", descriptor.name()))
        .print();
    Ok(())
}

async fn stop(path: &Path, root: &Path, bin_root: &Path, json: bool) -> Result<(), CliError> {
    let descriptor = load_descriptor(path)?;
    supervisor(&descriptor, root, bin_root).await?.stop().await?;

    Output::new(json)
        .field("node", &descriptor.slug())
        .field("status", "stopped")
        .message(&format!("Stopped {}", descriptor.name()))
        .print();
    Ok(())
}

async fn logs(
    path: &Path,
    root: &Path,
    bin_root: &Path,
    tail: usize,
    follow: bool,
) -> Result<(), CliError> {
    let descriptor = load_descriptor(path)?;
    let mut stream = supervisor(&descriptor, root, bin_root)
        .await?
        .tail_logs(tail, follow)
        .await?;

    while let Some(line) = stream.next_line().await {
        println!("{line}");
    }
    Ok(())
}

fn validate(path: &Path, json: bool) -> Result<(), CliError> {
    let descriptor = load_descriptor(path)?;
    descriptor
        .mode()
        .map_err(|_| CliError::Mode(descriptor.base().mode.clone()))?;

    Output::new(json)
        .field("node", &descriptor.slug())
        .field("kind", &descriptor.kind().to_string())
        .field("status", "valid")
        .message(&format!("{} is valid", path.display()))
        .print();
    Ok(())
}

fn show(path: &Path, json: bool) -> Result<(), CliError> {
    let descriptor = load_descriptor(path)?;
    let base = descriptor.base();

    Output::new(json)
        .field_value("descriptor", serde_json::to_value(&descriptor)?)
        .message(&format!(
            "Name:    {}\nKind:    {}\nMSP:     {}\nMode:    {}\nVersion: {}\nListen:  {}\nAdmin:   {}",
            descriptor.name(),
            descriptor.kind(),
            base.msp_id,
            base.mode,
            base.version,
            base.listen,
            base.admin,
        ))
        .print();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PEER_JSON: &str = r#"{
        "kind": "peer",
        "name": "Org1 Peer0",
        "organization_id": 7,
        "msp_id": "Org1MSP",
        "mode": "container",
        "version": "2.5.9",
        "listen": "0.0.0.0:7051",
        "external": "peer0.org1.example.com:7051",
        "operations": "127.0.0.1:9443",
        "admin": "127.0.0.1:7053",
        "chaincode": "0.0.0.0:7052",
        "events": "0.0.0.0:7061"
    }"#;

    fn write_descriptor(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_descriptor() {
        let file = write_descriptor(PEER_JSON);
        let descriptor = load_descriptor(file.path()).unwrap();
        assert_eq!(descriptor.slug(), "org1-peer0");
    }

    #[test]
    fn test_load_descriptor_rejects_garbage() {
        let file = write_descriptor("{ not json");
        assert!(matches!(
            load_descriptor(file.path()),
            Err(CliError::Descriptor(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_mode() {
        let file = write_descriptor(&PEER_JSON.replace("container", "bogus"));
        assert!(matches!(
            validate(file.path(), false),
            Err(CliError::Mode(m)) if m == "bogus"
        ));
    }
}
