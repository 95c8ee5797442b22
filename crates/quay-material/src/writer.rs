//! Material writing

use crate::{render_node_config, MaterialError, MaterialResult, NodeDirs};
use quay_types::NodeDescriptor;
use std::fs;
use std::path::{Path, PathBuf};

/// Organizational-unit mapping written into the MSP bundle.
///
/// Fixed content: the node kinds map onto the standard OU identifiers
/// certified by the organization's signing CA.
const OU_CONFIG: &str = "\
NodeOUs:
  Enable: true
  ClientOUIdentifier:
    Certificate: cacerts/ca.pem
    OrganizationalUnitIdentifier: client
  PeerOUIdentifier:
    Certificate: cacerts/ca.pem
    OrganizationalUnitIdentifier: peer
  AdminOUIdentifier:
    Certificate: cacerts/ca.pem
    OrganizationalUnitIdentifier: admin
  OrdererOUIdentifier:
    Certificate: cacerts/ca.pem
    OrganizationalUnitIdentifier: orderer
";

/// Identity and CA material needed to render a node's directory
#[derive(Debug, Clone, Copy)]
pub struct MaterialInputs<'a> {
    /// The node being rendered
    pub descriptor: &'a NodeDescriptor,
    /// Signing certificate, PEM
    pub sign_cert_pem: &'a str,
    /// Decrypted signing private key, PEM
    pub sign_key_pem: &'a str,
    /// TLS certificate, PEM
    pub tls_cert_pem: &'a str,
    /// Decrypted TLS private key, PEM
    pub tls_key_pem: &'a str,
    /// Organization signing CA certificate, PEM
    pub sign_ca_cert_pem: &'a str,
    /// Organization TLS root CA certificate, PEM
    pub tls_ca_cert_pem: &'a str,
}

/// Paths produced by a material write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPaths {
    /// Configuration directory
    pub config_dir: PathBuf,
    /// Runtime data directory
    pub data_dir: PathBuf,
    /// Rendered primary config file
    pub config_file: PathBuf,
    /// Node TLS CA file
    pub tls_ca_file: PathBuf,
    /// One trust-anchor file per address override, in descriptor order
    pub override_ca_files: Vec<PathBuf>,
    /// Service-mode log sink
    pub log_file: PathBuf,
}

/// Write the full on-disk material for one node.
///
/// Creates the MSP subtree (`signcerts/`, `keystore/`, `cacerts/`,
/// `tlscacerts/`), the TLS files, the OU mapping, one trust-anchor file
/// per address override and the rendered config file. Overwrites in
/// place; byte-identical for identical inputs.
pub fn write_node_material(
    dirs: &NodeDirs,
    inputs: &MaterialInputs<'_>,
) -> MaterialResult<MaterialPaths> {
    dirs.create()?;

    let msp = dirs.msp_dir();
    write_file(&msp.join("signcerts").join("cert.pem"), inputs.sign_cert_pem)?;
    write_file(&msp.join("keystore").join("key.pem"), inputs.sign_key_pem)?;
    write_file(&msp.join("cacerts").join("ca.pem"), inputs.sign_ca_cert_pem)?;
    write_file(
        &msp.join("tlscacerts").join("tlsca.pem"),
        inputs.tls_ca_cert_pem,
    )?;
    write_file(&msp.join("config.yaml"), OU_CONFIG)?;

    let tls = dirs.tls_dir();
    write_file(&tls.join("server.crt"), inputs.tls_cert_pem)?;
    write_file(&tls.join("server.key"), inputs.tls_key_pem)?;
    let tls_ca_file = tls.join("ca.crt");
    write_file(&tls_ca_file, inputs.tls_ca_cert_pem)?;

    // Each override's trust anchor gets its own file so the node binary
    // can reference it by path, separate from the node's own TLS CA.
    let overrides = &inputs.descriptor.base().address_overrides;
    let mut override_ca_files = Vec::with_capacity(overrides.len());
    for (idx, ov) in overrides.iter().enumerate() {
        let path = dirs.overrides_dir().join(format!("override-{idx}-ca.pem"));
        write_file(&path, &ov.tls_ca_cert_pem)?;
        override_ca_files.push(path);
    }

    let config_file = dirs.config_file();
    let rendered = render_node_config(inputs.descriptor, dirs, &override_ca_files);
    write_file(&config_file, &rendered)?;

    Ok(MaterialPaths {
        config_dir: dirs.config_dir(),
        data_dir: dirs.data_dir(),
        config_file,
        tls_ca_file,
        override_ca_files,
        log_file: dirs.log_file(),
    })
}

fn write_file(path: &Path, contents: &str) -> MaterialResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MaterialError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| MaterialError::io(path, e))
}
