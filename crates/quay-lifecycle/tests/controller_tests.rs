//! End-to-end controller scenarios over mocked collaborators

use bytes::Bytes;
use quay_channel::MockAdminTransport;
use quay_identity::{
    cert_fingerprint, InMemoryRegistry, MockIdentityProvider, Organization, DEFAULT_VALIDITY_DAYS,
};
use quay_lifecycle::{
    AuditOutcome, DirBinaryResolver, LifecycleError, NodeController, RecordingAudit,
};
use quay_supervise::{MockRunner, ServicePlatform};
use quay_types::{
    DescriptorBase, Endpoint, IdentityRef, NodeDescriptor, NodeState, OrdererDescriptor,
    PeerDescriptor,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const ORG_ID: u64 = 7;
const SIGN_CA_ID: u64 = 1;
const TLS_CA_ID: u64 = 2;

fn base(name: &str, mode: &str) -> DescriptorBase {
    DescriptorBase {
        name: name.to_string(),
        organization_id: ORG_ID,
        msp_id: "Org1MSP".to_string(),
        mode: mode.to_string(),
        version: "2.5.9".to_string(),
        listen: Endpoint::new("0.0.0.0", 7051),
        external: Endpoint::new("peer0.org1.example.com", 7051),
        operations: Endpoint::new("127.0.0.1", 9443),
        admin: Endpoint::new("127.0.0.1", 7053),
        domains: vec!["peer0.org1.example.com".to_string()],
        ip_sans: vec!["10.0.0.4".to_string()],
        env: BTreeMap::new(),
        sign_identity: None,
        tls_identity: None,
        address_overrides: vec![],
    }
}

fn peer(mode: &str) -> NodeDescriptor {
    NodeDescriptor::Peer(PeerDescriptor {
        base: base("Org1 Peer0", mode),
        chaincode: Endpoint::new("0.0.0.0", 7052),
        events: Endpoint::new("0.0.0.0", 7061),
    })
}

fn orderer(mode: &str) -> NodeDescriptor {
    NodeDescriptor::Orderer(OrdererDescriptor {
        base: base("Orderer One", mode),
        cluster_listen: Endpoint::new("0.0.0.0", 7055),
    })
}

struct Harness {
    tmp: TempDir,
    identity: Arc<MockIdentityProvider>,
    registry: Arc<InMemoryRegistry>,
    runner: Arc<MockRunner>,
    audit: Arc<RecordingAudit>,
    transport: Arc<MockAdminTransport>,
}

impl Harness {
    fn new() -> Self {
        let identity = Arc::new(MockIdentityProvider::new());
        identity.register_key(SIGN_CA_ID);
        identity.register_key(TLS_CA_ID);

        let registry = Arc::new(InMemoryRegistry::new());
        registry.insert(Organization {
            id: ORG_ID,
            msp_id: "Org1MSP".to_string(),
            sign_ca_key_id: SIGN_CA_ID,
            tls_ca_key_id: TLS_CA_ID,
            sign_ca_cert_pem: "-----BEGIN CERTIFICATE-----\nSIGN-CA\n-----END CERTIFICATE-----\n"
                .to_string(),
            tls_ca_cert_pem: "-----BEGIN CERTIFICATE-----\nTLS-CA\n-----END CERTIFICATE-----\n"
                .to_string(),
        });

        Self {
            tmp: tempfile::tempdir().unwrap(),
            identity,
            registry,
            runner: Arc::new(MockRunner::new()),
            audit: Arc::new(RecordingAudit::new()),
            transport: Arc::new(MockAdminTransport::new()),
        }
    }

    fn material_root(&self) -> PathBuf {
        self.tmp.path().join("nodes")
    }

    fn unit_dir(&self) -> PathBuf {
        self.tmp.path().join("units")
    }

    fn install_binary(&self, kind: &str, version: &str) {
        let dir = self.tmp.path().join("bin").join(version);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(kind), b"#!/bin/sh\n").unwrap();
    }

    fn controller(&self, descriptor: NodeDescriptor) -> NodeController {
        std::fs::create_dir_all(self.unit_dir()).unwrap();
        NodeController::new(
            descriptor,
            self.material_root(),
            self.identity.clone(),
            self.registry.clone(),
            Arc::new(DirBinaryResolver::new(self.tmp.path().join("bin"))),
            self.runner.clone(),
            self.audit.clone(),
        )
        .with_service_platform(ServicePlatform::Systemd, self.unit_dir())
        .with_admin_transport(self.transport.clone())
    }
}

fn count(haystack: &[String], needle: &str) -> usize {
    haystack.iter().filter(|item| *item == needle).count()
}

// ==================== Init ====================

#[tokio::test]
async fn test_init_issues_identities_and_writes_material() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));

    let descriptor = controller.init().await.unwrap();
    let base = descriptor.base();

    let sign = base.sign_identity.as_ref().unwrap();
    let tls = base.tls_identity.as_ref().unwrap();
    assert_ne!(sign.key_id, tls.key_id);
    assert_eq!(sign.ca_key_id, Some(SIGN_CA_ID));
    assert_eq!(tls.ca_key_id, Some(TLS_CA_ID));
    assert!(sign.cert_pem.contains("BEGIN CERTIFICATE"));

    let dirs = controller.dirs();
    assert!(dirs.msp_dir().join("signcerts/cert.pem").is_file());
    assert!(dirs.msp_dir().join("keystore/key.pem").is_file());
    assert!(dirs.msp_dir().join("config.yaml").is_file());
    assert!(dirs.tls_dir().join("server.crt").is_file());
    assert!(dirs.config_file().is_file());
    assert_eq!(controller.state(), NodeState::Initialized);
}

#[tokio::test]
async fn test_init_normalizes_sans_exactly_once() {
    let h = Harness::new();
    let mut descriptor = peer("container");
    // localhost already listed; normalization must not duplicate it
    descriptor.base_mut().domains.push("localhost".to_string());
    let mut controller = h.controller(descriptor);

    let descriptor = controller.init().await.unwrap();
    let base = descriptor.base();
    assert_eq!(count(&base.domains, "localhost"), 1);
    assert_eq!(count(&base.ip_sans, "127.0.0.1"), 1);
    assert!(base.domains.contains(&"peer0.org1.example.com".to_string()));

    // Both CSRs carried the normalized SAN lists
    for (_, _, request) in h.identity.sign_calls() {
        assert_eq!(count(&request.domains, "localhost"), 1);
        assert_eq!(count(&request.ip_sans, "127.0.0.1"), 1);
    }
}

#[tokio::test]
async fn test_init_refuses_existing_node_directory() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));

    controller.init().await.unwrap();
    let err = controller.init().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Configuration { .. }));

    // No extra identities were issued by the failed re-run
    assert_eq!(h.identity.sign_calls().len(), 2);
}

// ==================== Start / Stop ====================

#[tokio::test]
async fn test_container_start_runs_detached_container() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();

    let lines = h.runner.call_lines();
    let run_line = lines
        .iter()
        .find(|line| line.starts_with("docker run"))
        .unwrap();
    assert!(run_line.contains("--name org1msp-org1-peer0"));
    assert!(run_line.contains("quayside/peer:2.5.9"));
    assert!(run_line.contains("-p 7051:7051"));
    assert_eq!(controller.state(), NodeState::Running);
}

#[tokio::test]
async fn test_service_start_writes_unit_and_restarts_it() {
    let h = Harness::new();
    h.install_binary("peer", "2.5.9");
    let mut controller = h.controller(peer("service"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();

    let unit_file = h.unit_dir().join("peer-org1-peer0.service");
    assert!(unit_file.is_file());
    let unit = std::fs::read_to_string(unit_file).unwrap();
    assert!(unit.contains("2.5.9/peer"));

    let lines = h.runner.call_lines();
    assert!(lines.contains(&"systemctl daemon-reload".to_string()));
    assert!(lines.contains(&"systemctl restart peer-org1-peer0.service".to_string()));
    assert_eq!(controller.state(), NodeState::Running);
}

#[tokio::test]
async fn test_unsupported_mode_fails_start_without_side_effects() {
    let h = Harness::new();
    let mut controller = h.controller(peer("bogus"));

    let err = controller.start().await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::UnsupportedMode { ref mode, .. } if mode == "bogus"
    ));

    assert!(h.runner.calls().is_empty());
    assert!(!h.material_root().exists());
    assert_eq!(std::fs::read_dir(h.unit_dir()).unwrap().count(), 0);
    assert_eq!(controller.state(), NodeState::Uninitialized);
}

#[tokio::test]
async fn test_missing_binary_blocks_service_start() {
    let h = Harness::new();
    let mut controller = h.controller(peer("service"));
    controller.init().await.unwrap();

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::BinaryNotFound { .. }));
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn test_container_stop() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();
    controller.stop().await.unwrap();

    let lines = h.runner.call_lines();
    assert!(lines.contains(&"docker stop org1msp-org1-peer0".to_string()));
    assert_eq!(controller.state(), NodeState::Stopped);
}

#[tokio::test]
async fn test_failed_start_moves_to_error_state() {
    let h = Harness::new();
    h.runner.fail_on("docker", "run", "no such image");
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Process { .. }));
    assert_eq!(controller.state(), NodeState::Error);
}

// ==================== Certificate Renewal ====================

#[tokio::test]
async fn test_renewal_preserves_keys_and_sans() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    let before = controller.init().await.unwrap();
    controller.start().await.unwrap();

    controller.renew_certificates().await.unwrap();
    let after = controller.descriptor();

    let (sign_before, sign_after) = (
        before.base().sign_identity.as_ref().unwrap(),
        after.base().sign_identity.as_ref().unwrap(),
    );
    assert_eq!(sign_after.key_id, sign_before.key_id);
    assert_ne!(sign_after.cert_pem, sign_before.cert_pem);

    let tls_before = before.base().tls_identity.as_ref().unwrap();
    let tls_after = after.base().tls_identity.as_ref().unwrap();
    assert_eq!(tls_after.key_id, tls_before.key_id);
    assert_ne!(tls_after.cert_pem, tls_before.cert_pem);

    // Renewal requests reuse the normalized SAN lists and the standard
    // validity window
    let renewals = h.identity.renew_calls();
    assert_eq!(renewals.len(), 2);
    for (_, request) in renewals {
        assert_eq!(request.domains, before.base().domains);
        assert_eq!(request.ip_sans, before.base().ip_sans);
        assert_eq!(request.valid_for_days, DEFAULT_VALIDITY_DAYS);
    }

    // Stopped, renewed, restarted
    let lines = h.runner.call_lines();
    assert!(count(&lines, "docker stop org1msp-org1-peer0") >= 1);
    assert_eq!(controller.state(), NodeState::Running);

    // Fresh certificates are on disk
    let on_disk =
        std::fs::read_to_string(controller.dirs().msp_dir().join("signcerts/cert.pem")).unwrap();
    assert_eq!(on_disk, sign_after.cert_pem);
}

#[tokio::test]
async fn test_renewal_repairs_missing_ca_association() {
    let h = Harness::new();
    h.identity.register_key(11);
    h.identity.register_key(12);

    // Descriptor persisted before CA references were recorded
    let mut descriptor = peer("container");
    descriptor.base_mut().sign_identity = Some(IdentityRef {
        key_id: 11,
        cert_pem: "-----BEGIN CERTIFICATE-----\nOLD-SIGN\n-----END CERTIFICATE-----\n".to_string(),
        ca_key_id: None,
    });
    descriptor.base_mut().tls_identity = Some(IdentityRef {
        key_id: 12,
        cert_pem: "-----BEGIN CERTIFICATE-----\nOLD-TLS\n-----END CERTIFICATE-----\n".to_string(),
        ca_key_id: None,
    });
    let mut controller = h.controller(descriptor);

    controller.renew_certificates().await.unwrap();

    assert_eq!(h.identity.signing_ca(11), Some(SIGN_CA_ID));
    assert_eq!(h.identity.signing_ca(12), Some(TLS_CA_ID));
    let base = controller.descriptor().base();
    assert_eq!(base.sign_identity.as_ref().unwrap().ca_key_id, Some(SIGN_CA_ID));
    assert_eq!(base.tls_identity.as_ref().unwrap().ca_key_id, Some(TLS_CA_ID));
}

#[tokio::test]
async fn test_renewal_restart_failure_keeps_renewed_certificates() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    let before = controller.init().await.unwrap();

    h.runner.fail_on("docker", "run", "daemon unreachable");
    let err = controller.renew_certificates().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Process { .. }));

    // The renewed certificates survive the failed restart; a later
    // start() picks them up as-is.
    let after = controller.descriptor().base();
    assert_ne!(
        after.sign_identity.as_ref().unwrap().cert_pem,
        before.base().sign_identity.as_ref().unwrap().cert_pem
    );
    assert_eq!(h.identity.renew_calls().len(), 2);
    assert_eq!(controller.state(), NodeState::Error);
}

// ==================== Channel Participation ====================

#[tokio::test]
async fn test_join_channel_posts_block_and_decodes_info() {
    let h = Harness::new();
    h.transport.set_json(
        "/participation/v1/channels",
        json!({"name": "mychannel", "height": 1, "blockHash": "00"}),
    );
    let controller = h.controller(peer("container"));

    let info = controller
        .join_channel(Bytes::from_static(b"genesis-block"))
        .await
        .unwrap();
    assert_eq!(info.name, "mychannel");

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/participation/v1/channels");
    assert_eq!(requests[0].body.as_deref(), Some(&b"genesis-block"[..]));
}

#[tokio::test]
async fn test_peer_leave_restarts_the_node() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();
    let calls_before = h.runner.calls().len();

    controller.leave_channel("mychannel").await.unwrap();

    let requests = h.transport.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/participation/v1/channels/mychannel");

    // Channel removal only takes effect on restart
    let lines = h.runner.call_lines();
    assert!(h.runner.calls().len() > calls_before);
    assert!(count(&lines, "docker stop org1msp-org1-peer0") >= 1);
    assert_eq!(controller.state(), NodeState::Running);
}

#[tokio::test]
async fn test_orderer_leave_is_protocol_only() {
    let h = Harness::new();
    let mut controller = h.controller(orderer("container"));

    controller.leave_channel("mychannel").await.unwrap();

    assert_eq!(h.transport.requests().len(), 1);
    assert!(h.runner.calls().is_empty());
}

// ==================== Log Tailing ====================

#[tokio::test]
async fn test_tail_logs_unavailable_before_first_start() {
    let h = Harness::new();
    h.install_binary("peer", "2.5.9");
    let mut controller = h.controller(peer("service"));
    controller.init().await.unwrap();

    let err = controller.tail_logs(10, false).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::LogsUnavailable { ref node } if node == "org1-peer0"
    ));
}

#[tokio::test]
async fn test_tail_logs_reads_service_log_file() {
    let h = Harness::new();
    h.install_binary("peer", "2.5.9");
    let mut controller = h.controller(peer("service"));
    controller.init().await.unwrap();
    std::fs::write(controller.dirs().log_file(), "one\ntwo\nthree\n").unwrap();

    let mut stream = controller.tail_logs(2, false).await.unwrap();
    assert_eq!(stream.next_line().await.as_deref(), Some("two"));
    assert_eq!(stream.next_line().await.as_deref(), Some("three"));
    assert_eq!(stream.next_line().await, None);
}

// ==================== Audit Trail ====================

#[tokio::test]
async fn test_audit_records_operations_in_order() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();
    controller.stop().await.unwrap();

    let events = h.audit.events();
    let operations: Vec<&str> = events.iter().map(|e| e.operation.as_str()).collect();
    assert_eq!(operations, ["init", "start", "stop"]);
    assert!(events.iter().all(|e| e.outcome == AuditOutcome::Success));
    assert!(events.iter().all(|e| e.node == "org1-peer0"));
}

#[tokio::test]
async fn test_audit_renewal_success_carries_fingerprints() {
    let h = Harness::new();
    let mut controller = h.controller(peer("container"));
    controller.init().await.unwrap();
    controller.start().await.unwrap();

    controller.renew_certificates().await.unwrap();

    let events = h.audit.events();
    let renew = events
        .iter()
        .find(|e| e.operation == "renew-certificates")
        .unwrap();
    assert_eq!(renew.outcome, AuditOutcome::Success);

    let base = controller.descriptor().base();
    let detail = renew.detail.as_ref().unwrap();
    assert!(detail.contains(&cert_fingerprint(
        &base.sign_identity.as_ref().unwrap().cert_pem
    )));
    assert!(detail.contains(&cert_fingerprint(
        &base.tls_identity.as_ref().unwrap().cert_pem
    )));
}

#[tokio::test]
async fn test_audit_records_failure_detail() {
    let h = Harness::new();
    let mut controller = h.controller(peer("bogus"));
    controller.start().await.unwrap_err();

    let events = h.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Failure);
    assert!(events[0].detail.as_ref().unwrap().contains("bogus"));
}
