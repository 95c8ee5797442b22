//! Launch plan construction from a descriptor

use quay_material::NodeDirs;
use quay_supervise::{LaunchPlan, CONTAINER_CONFIG_DIR, CONTAINER_DATA_DIR};
use quay_types::{DeployMode, NodeDescriptor};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default image reference for a node kind pinned to a version
pub fn default_image(descriptor: &NodeDescriptor) -> String {
    format!("quayside/{}:{}", descriptor.kind(), descriptor.base().version)
}

/// Build the environment/argument set and port list for a node.
///
/// Paths in the environment are host paths in service mode and the
/// container mount points in container mode. Descriptor environment
/// overrides are applied last so operators can replace anything.
pub fn build_launch_plan(
    descriptor: &NodeDescriptor,
    dirs: &NodeDirs,
    mode: DeployMode,
    binary: Option<PathBuf>,
    image: Option<String>,
) -> LaunchPlan {
    let base = descriptor.base();

    let (config_file, data_dir_env) = match mode {
        DeployMode::Service => (
            dirs.config_file().display().to_string(),
            dirs.data_dir().display().to_string(),
        ),
        DeployMode::Container => (
            format!("{CONTAINER_CONFIG_DIR}/config.yaml"),
            CONTAINER_DATA_DIR.to_string(),
        ),
    };

    let mut env = BTreeMap::new();
    env.insert("QUAY_CONFIG_FILE".to_string(), config_file);
    env.insert("QUAY_DATA_DIR".to_string(), data_dir_env);
    env.insert("QUAY_MSP_ID".to_string(), base.msp_id.clone());
    env.insert("QUAY_LISTEN_ADDRESS".to_string(), base.listen.to_string());
    for (key, value) in &base.env {
        env.insert(key.clone(), value.clone());
    }

    let mut candidates = vec![base.listen.port, base.operations.port, base.admin.port];
    match descriptor {
        NodeDescriptor::Peer(peer) => {
            candidates.push(peer.chaincode.port);
            candidates.push(peer.events.port);
        }
        NodeDescriptor::Orderer(orderer) => {
            candidates.push(orderer.cluster_listen.port);
        }
    }
    let mut ports = Vec::with_capacity(candidates.len());
    for port in candidates {
        if !ports.contains(&port) {
            ports.push(port);
        }
    }

    LaunchPlan {
        slug: descriptor.slug(),
        kind: descriptor.kind(),
        msp_id: base.msp_id.clone(),
        binary,
        image,
        args: vec!["start".to_string()],
        env,
        config_dir: dirs.config_dir(),
        data_dir: dirs.data_dir(),
        log_file: dirs.log_file(),
        ports,
    }
}
