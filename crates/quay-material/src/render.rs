//! Node configuration rendering

use crate::NodeDirs;
use quay_types::NodeDescriptor;
use std::fmt::Write;
use std::path::Path;

/// Render the node's primary configuration file.
///
/// Parameterized by the descriptor's addresses, the data path, the MSP
/// id and the address overrides; each override references the trust
/// anchor file materialized next to the config (`override_ca_files`
/// must be in descriptor order). Output is deterministic for identical
/// inputs.
pub fn render_node_config(
    descriptor: &NodeDescriptor,
    dirs: &NodeDirs,
    override_ca_files: &[std::path::PathBuf],
) -> String {
    let base = descriptor.base();
    let mut out = String::new();

    let _ = writeln!(out, "# Generated by quayside. Overwritten on every material write.");
    let _ = writeln!(out, "node:");
    let _ = writeln!(out, "  id: {}", descriptor.slug());
    let _ = writeln!(out, "  kind: {}", descriptor.kind());
    let _ = writeln!(out, "  mspId: {}", base.msp_id);
    let _ = writeln!(out, "  listenAddress: {}", base.listen);
    let _ = writeln!(out, "  externalAddress: {}", base.external);
    let _ = writeln!(out, "  operationsAddress: {}", base.operations);
    let _ = writeln!(out, "  adminAddress: {}", base.admin);
    match descriptor {
        NodeDescriptor::Peer(peer) => {
            let _ = writeln!(out, "  chaincodeAddress: {}", peer.chaincode);
            let _ = writeln!(out, "  eventsAddress: {}", peer.events);
        }
        NodeDescriptor::Orderer(orderer) => {
            let _ = writeln!(out, "  clusterListenAddress: {}", orderer.cluster_listen);
        }
    }

    let _ = writeln!(out, "paths:");
    let _ = writeln!(out, "  data: {}", display(&dirs.data_dir()));
    let _ = writeln!(out, "  msp: {}", display(&dirs.msp_dir()));
    let _ = writeln!(out, "tls:");
    let _ = writeln!(out, "  cert: {}", display(&dirs.tls_dir().join("server.crt")));
    let _ = writeln!(out, "  key: {}", display(&dirs.tls_dir().join("server.key")));
    let _ = writeln!(out, "  ca: {}", display(&dirs.tls_dir().join("ca.crt")));

    if !base.address_overrides.is_empty() {
        let _ = writeln!(out, "addressOverrides:");
        for (idx, ov) in base.address_overrides.iter().enumerate() {
            let _ = writeln!(out, "  - from: {}", ov.from);
            let _ = writeln!(out, "    to: {}", ov.to);
            let _ = writeln!(out, "    caCertsFile: {}", display(&override_ca_files[idx]));
        }
    }

    out
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
