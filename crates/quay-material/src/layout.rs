//! On-disk directory layout for one node instance

use crate::{MaterialError, MaterialResult};
use quay_types::NodeKind;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout `<root>/<kind>s/<slug>/{config,data}` for one node.
///
/// `config/` holds MSP and TLS material plus the rendered node config;
/// `data/` holds the node's runtime state and, in service mode, its log
/// file. The tree is exclusively owned by one controller instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDirs {
    node_dir: PathBuf,
}

impl NodeDirs {
    /// Layout for a node under the given material root
    pub fn new(root: impl AsRef<Path>, kind: NodeKind, slug: &str) -> Self {
        Self {
            node_dir: root.as_ref().join(format!("{kind}s")).join(slug),
        }
    }

    /// The node's private directory
    pub fn node_dir(&self) -> &Path {
        &self.node_dir
    }

    /// Configuration directory (MSP, TLS, rendered config)
    pub fn config_dir(&self) -> PathBuf {
        self.node_dir.join("config")
    }

    /// Runtime data directory
    pub fn data_dir(&self) -> PathBuf {
        self.node_dir.join("data")
    }

    /// MSP bundle directory
    pub fn msp_dir(&self) -> PathBuf {
        self.config_dir().join("msp")
    }

    /// TLS material directory
    pub fn tls_dir(&self) -> PathBuf {
        self.config_dir().join("tls")
    }

    /// Address-override trust-anchor directory
    pub fn overrides_dir(&self) -> PathBuf {
        self.config_dir().join("overrides")
    }

    /// Rendered primary configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.yaml")
    }

    /// Service-mode log sink
    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join("node.log")
    }

    /// Whether the node directory already exists.
    ///
    /// `Init` is not idempotent by design; callers guard re-runs with
    /// this check.
    pub fn exists(&self) -> bool {
        self.node_dir.exists()
    }

    /// Create the config and data directories
    pub fn create(&self) -> MaterialResult<()> {
        for dir in [self.config_dir(), self.data_dir()] {
            fs::create_dir_all(&dir).map_err(|e| MaterialError::io(&dir, e))?;
        }
        Ok(())
    }
}
