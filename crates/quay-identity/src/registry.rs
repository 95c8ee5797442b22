//! Organization registry contract

use crate::{IdentityError, IdentityResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity anchors of one organization on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Registry id
    pub id: u64,
    /// MSP id, e.g. "Org1MSP"
    pub msp_id: String,
    /// Key id of the organization's signing CA
    pub sign_ca_key_id: u64,
    /// Key id of the organization's TLS root CA
    pub tls_ca_key_id: u64,
    /// Signing CA certificate, PEM encoded
    pub sign_ca_cert_pem: String,
    /// TLS root CA certificate, PEM encoded
    pub tls_ca_cert_pem: String,
}

/// Lookup of organization identity anchors, owned by an external
/// registry service.
#[async_trait]
pub trait OrganizationRegistry: Send + Sync {
    /// Fetch one organization by registry id
    async fn organization(&self, id: u64) -> IdentityResult<Organization>;
}

/// Map-backed registry used by tests and local tooling
#[derive(Default)]
pub struct InMemoryRegistry {
    orgs: RwLock<HashMap<u64, Organization>>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an organization
    pub fn insert(&self, org: Organization) {
        self.orgs.write().insert(org.id, org);
    }
}

#[async_trait]
impl OrganizationRegistry for InMemoryRegistry {
    async fn organization(&self, id: u64) -> IdentityResult<Organization> {
        self.orgs
            .read()
            .get(&id)
            .cloned()
            .ok_or(IdentityError::OrganizationNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup() {
        let registry = InMemoryRegistry::new();
        registry.insert(Organization {
            id: 7,
            msp_id: "Org1MSP".to_string(),
            sign_ca_key_id: 1,
            tls_ca_key_id: 2,
            sign_ca_cert_pem: "sign-ca".to_string(),
            tls_ca_cert_pem: "tls-ca".to_string(),
        });

        let org = registry.organization(7).await.unwrap();
        assert_eq!(org.msp_id, "Org1MSP");
        assert_eq!(
            registry.organization(8).await.unwrap_err(),
            IdentityError::OrganizationNotFound(8)
        );
    }
}
