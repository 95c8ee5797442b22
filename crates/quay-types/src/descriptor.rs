//! Deployment descriptors for peer and orderer nodes

use crate::{Endpoint, TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The kind of ledger node a descriptor provisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Transaction-executing node
    Peer,
    /// Block-sequencing node
    Orderer,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peer => write!(f, "peer"),
            Self::Orderer => write!(f, "orderer"),
        }
    }
}

/// How a node process is run.
///
/// Descriptors keep the raw mode string (see [`DescriptorBase::mode`])
/// so an unrecognized value survives persistence and is rejected only
/// when a process operation actually needs a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// Host-managed service (systemd or launchd)
    Service,
    /// Detached container managed by the container runtime
    Container,
}

impl fmt::Display for DeployMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Container => write!(f, "container"),
        }
    }
}

impl FromStr for DeployMode {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(Self::Service),
            "container" => Ok(Self::Container),
            other => Err(TypesError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Reference to provider-owned key material plus the issued certificate.
///
/// The private key never leaves the identity provider; descriptors hold
/// only its id and the signed certificate PEM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRef {
    /// Provider key id
    pub key_id: u64,
    /// Issued certificate, PEM encoded
    pub cert_pem: String,
    /// Key id of the CA that signed (and re-signs) this identity
    #[serde(default)]
    pub ca_key_id: Option<u64>,
}

/// Redirects a node's outbound calls from one published address to
/// another while preserving cryptographic trust in the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOverride {
    /// Address the node would normally dial
    pub from: String,
    /// Address to dial instead
    pub to: String,
    /// Trust anchor for the target, PEM encoded
    pub tls_ca_cert_pem: String,
}

/// Fields shared by every node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorBase {
    /// Logical node name, e.g. "Org1 Peer0"
    pub name: String,
    /// Owning organization id in the registry
    pub organization_id: u64,
    /// MSP id of the owning organization
    pub msp_id: String,
    /// Raw deployment mode string ("service" or "container")
    pub mode: String,
    /// Node binary / image version, e.g. "2.5.9"
    pub version: String,
    /// Primary listen address
    pub listen: Endpoint,
    /// Externally published address
    pub external: Endpoint,
    /// Operations (health/metrics) address
    pub operations: Endpoint,
    /// Administrative endpoint for participation calls
    pub admin: Endpoint,
    /// DNS names the TLS certificate must cover
    #[serde(default)]
    pub domains: Vec<String>,
    /// IP addresses the TLS certificate must cover
    #[serde(default)]
    pub ip_sans: Vec<String>,
    /// Extra environment variables passed to the node process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Signing identity, populated by Init
    #[serde(default)]
    pub sign_identity: Option<IdentityRef>,
    /// TLS identity, populated by Init
    #[serde(default)]
    pub tls_identity: Option<IdentityRef>,
    /// Outbound address overrides
    #[serde(default)]
    pub address_overrides: Vec<AddressOverride>,
}

/// Peer-specific deployment fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Shared fields
    #[serde(flatten)]
    pub base: DescriptorBase,
    /// Chaincode callback address
    pub chaincode: Endpoint,
    /// Event delivery address
    pub events: Endpoint,
}

/// Orderer-specific deployment fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdererDescriptor {
    /// Shared fields
    #[serde(flatten)]
    pub base: DescriptorBase,
    /// Cluster-internal listen address
    pub cluster_listen: Endpoint,
}

/// Deployment descriptor for a single node instance, one variant per
/// node kind. Conversions between variants are exhaustive matches that
/// return `None` for a non-applicable kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeDescriptor {
    /// Peer node
    Peer(PeerDescriptor),
    /// Ordering-service node
    Orderer(OrdererDescriptor),
}

impl NodeDescriptor {
    /// The node kind of this descriptor
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Peer(_) => NodeKind::Peer,
            Self::Orderer(_) => NodeKind::Orderer,
        }
    }

    /// Shared fields, read-only
    pub fn base(&self) -> &DescriptorBase {
        match self {
            Self::Peer(p) => &p.base,
            Self::Orderer(o) => &o.base,
        }
    }

    /// Shared fields, mutable
    pub fn base_mut(&mut self) -> &mut DescriptorBase {
        match self {
            Self::Peer(p) => &mut p.base,
            Self::Orderer(o) => &mut o.base,
        }
    }

    /// Logical node name
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Filesystem/service/container slug for this node
    pub fn slug(&self) -> String {
        slug(&self.base().name)
    }

    /// Parse the configured deployment mode.
    ///
    /// Total over the stored string: anything outside the two known
    /// strategies is an `UnsupportedMode` error, never a silent default.
    pub fn mode(&self) -> TypesResult<DeployMode> {
        self.base().mode.parse()
    }

    /// Peer view of this descriptor, if it is a peer
    pub fn as_peer(&self) -> Option<&PeerDescriptor> {
        match self {
            Self::Peer(p) => Some(p),
            Self::Orderer(_) => None,
        }
    }

    /// Orderer view of this descriptor, if it is an orderer
    pub fn as_orderer(&self) -> Option<&OrdererDescriptor> {
        match self {
            Self::Peer(_) => None,
            Self::Orderer(o) => Some(o),
        }
    }
}

/// Derive the on-disk / unit / container slug for a node name:
/// lowercased, spaces replaced with hyphens.
pub fn slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_peer() -> NodeDescriptor {
        NodeDescriptor::Peer(PeerDescriptor {
            base: DescriptorBase {
                name: "Org1 Peer0".to_string(),
                organization_id: 7,
                msp_id: "Org1MSP".to_string(),
                mode: "container".to_string(),
                version: "2.5.9".to_string(),
                listen: Endpoint::new("0.0.0.0", 7051),
                external: Endpoint::new("peer0.org1.example.com", 7051),
                operations: Endpoint::new("127.0.0.1", 9443),
                admin: Endpoint::new("127.0.0.1", 7053),
                domains: vec!["peer0.org1.example.com".to_string()],
                ip_sans: vec!["10.0.0.4".to_string()],
                env: BTreeMap::from([("CORE_PEER_GOSSIP_BOOTSTRAP".to_string(), "peer0:7051".to_string())]),
                sign_identity: Some(IdentityRef {
                    key_id: 11,
                    cert_pem: "-----BEGIN CERTIFICATE-----\nAAA\n-----END CERTIFICATE-----\n".to_string(),
                    ca_key_id: Some(1),
                }),
                tls_identity: None,
                address_overrides: vec![AddressOverride {
                    from: "orderer1:7050".to_string(),
                    to: "orderer1.external:7050".to_string(),
                    tls_ca_cert_pem: "-----BEGIN CERTIFICATE-----\nBBB\n-----END CERTIFICATE-----\n".to_string(),
                }],
            },
            chaincode: Endpoint::new("0.0.0.0", 7052),
            events: Endpoint::new("0.0.0.0", 7061),
        })
    }

    #[test]
    fn test_descriptor_round_trip() {
        let desc = sample_peer();
        let json = serde_json::to_string_pretty(&desc).unwrap();
        let back: NodeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_kind_tag_in_json() {
        let json = serde_json::to_value(sample_peer()).unwrap();
        assert_eq!(json["kind"], "peer");
        assert_eq!(json["listen"], "0.0.0.0:7051");
    }

    #[test]
    fn test_unknown_mode_survives_round_trip() {
        let mut desc = sample_peer();
        desc.base_mut().mode = "bogus".to_string();
        let json = serde_json::to_string(&desc).unwrap();
        let back: NodeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.base().mode, "bogus");
        assert!(matches!(
            back.mode(),
            Err(TypesError::UnsupportedMode(m)) if m == "bogus"
        ));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("service".parse::<DeployMode>().unwrap(), DeployMode::Service);
        assert_eq!("container".parse::<DeployMode>().unwrap(), DeployMode::Container);
        assert!("Docker".parse::<DeployMode>().is_err());
    }

    #[test]
    fn test_variant_conversions() {
        let desc = sample_peer();
        assert!(desc.as_peer().is_some());
        assert!(desc.as_orderer().is_none());
        assert_eq!(desc.kind(), NodeKind::Peer);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Org1 Peer0"), "org1-peer0");
        assert_eq!(slug("  Orderer One  "), "orderer-one");
        assert_eq!(slug("orderer1"), "orderer1");
    }
}
