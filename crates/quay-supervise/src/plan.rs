//! Launch plans

use quay_types::NodeKind;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything a strategy needs to run one node: resolved binary or
/// pinned image, argument/environment set and the node's directories.
/// Built by the lifecycle controller from the deployment descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Node slug (directory, unit and container naming)
    pub slug: String,
    /// Node kind
    pub kind: NodeKind,
    /// Owning organization's MSP id
    pub msp_id: String,
    /// Resolved node binary (service mode)
    pub binary: Option<PathBuf>,
    /// Pinned image reference (container mode)
    pub image: Option<String>,
    /// Process arguments
    pub args: Vec<String>,
    /// Environment variables (sorted map so rendering is deterministic)
    pub env: BTreeMap<String, String>,
    /// Node config directory
    pub config_dir: PathBuf,
    /// Node data directory
    pub data_dir: PathBuf,
    /// Service-mode log sink
    pub log_file: PathBuf,
    /// Ports to publish in container mode
    pub ports: Vec<u16>,
}

impl LaunchPlan {
    /// Service unit name: `<kind>-<slug>`
    pub fn unit_name(&self) -> String {
        format!("{}-{}", self.kind, self.slug)
    }

    /// Container name: `<lowercased msp id>-<slug>`.
    ///
    /// Deterministic so repeated starts target the same logical
    /// container.
    pub fn container_name(&self) -> String {
        format!("{}-{}", self.msp_id.to_lowercase(), self.slug)
    }
}
