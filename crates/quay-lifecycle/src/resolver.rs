//! Node binary resolution

use crate::{LifecycleError, LifecycleResult};
use async_trait::async_trait;
use quay_types::NodeKind;
use std::path::{Path, PathBuf};

/// Resolves the node binary for a kind and version.
///
/// Downloading and caching belong to the implementation; the
/// controller only needs a usable path back.
#[async_trait]
pub trait BinaryResolver: Send + Sync {
    /// Filesystem path of the binary for `kind` at `version`
    async fn binary_path(&self, kind: NodeKind, version: &str) -> LifecycleResult<PathBuf>;
}

/// Resolver over a local binary cache laid out as
/// `<root>/<version>/<kind>`.
pub struct DirBinaryResolver {
    root: PathBuf,
}

impl DirBinaryResolver {
    /// Resolver over the given cache root
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl BinaryResolver for DirBinaryResolver {
    async fn binary_path(&self, kind: NodeKind, version: &str) -> LifecycleResult<PathBuf> {
        let path = self.root.join(version).join(kind.to_string());
        if path.is_file() {
            Ok(path)
        } else {
            Err(LifecycleError::BinaryNotFound {
                kind,
                version: version.to_string(),
                root: self.root.clone(),
            })
        }
    }
}
