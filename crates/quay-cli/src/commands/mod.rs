//! CLI command implementations

pub mod channel;
pub mod node;
