//! # quay-material
//!
//! Config Material Generator: renders the on-disk directory layout and
//! configuration a node binary needs from a deployment descriptor and
//! the identity material issued for it.
//!
//! Generation is a pure function of its inputs (invoking it twice with
//! the same inputs produces byte-identical files) and overwrites in
//! place, so certificate renewal and reconfiguration re-run it without
//! re-running `Init`.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod layout;
mod render;
mod writer;

pub use error::MaterialError;
pub use layout::NodeDirs;
pub use render::render_node_config;
pub use writer::{write_node_material, MaterialInputs, MaterialPaths};

/// Result type for material generation
pub type MaterialResult<T> = Result<T, MaterialError>;
