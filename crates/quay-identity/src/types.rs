//! Certificate request and response types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Validity window applied to issued and renewed certificates, in days.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Asymmetric key algorithm requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// ECDSA over NIST P-256
    EcdsaP256,
    /// ECDSA over NIST P-384
    EcdsaP384,
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        Self::EcdsaP256
    }
}

/// Handle to a provider-owned key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHandle {
    /// Provider key id
    pub key_id: u64,
}

/// Certificate signing/renewal request.
///
/// Renewals reuse the existing key pair; only the validity window (and,
/// if explicitly changed, the SAN lists) move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRequest {
    /// Subject common name
    pub common_name: String,
    /// DNS subject alternative names
    pub domains: Vec<String>,
    /// IP subject alternative names
    pub ip_sans: Vec<String>,
    /// Validity window in days from issuance
    pub valid_for_days: u32,
}

impl CertRequest {
    /// A request with the standard one-year validity window
    pub fn new(common_name: impl Into<String>, domains: Vec<String>, ip_sans: Vec<String>) -> Self {
        Self {
            common_name: common_name.into(),
            domains,
            ip_sans,
            valid_for_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

/// A signed certificate bound to a provider key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedKey {
    /// Provider key id the certificate belongs to
    pub key_id: u64,
    /// Certificate, PEM encoded
    pub cert_pem: String,
}

/// SHA-256 fingerprint of a PEM blob, lowercase hex.
///
/// Used in audit events and renewal assertions; stable for identical
/// input bytes.
pub fn cert_fingerprint(pem: &str) -> String {
    let digest = Sha256::digest(pem.as_bytes());
    hex::encode(digest)
}
