//! Node lifecycle controller

use crate::audit::{AuditEvent, AuditOutcome, AuditSink};
use crate::plan::{build_launch_plan, default_image};
use crate::resolver::BinaryResolver;
use crate::{LifecycleError, LifecycleResult};
use bytes::Bytes;
use quay_channel::{AdminTransport, ChannelClient, ChannelInfo, ChannelSummary, TlsIdentity};
use quay_identity::{
    cert_fingerprint, normalize_sans, CertRequest, IdentityError, IdentityProvider, KeyAlgorithm,
    Organization, OrganizationRegistry,
};
use quay_material::{write_node_material, MaterialError, MaterialInputs, MaterialPaths, NodeDirs};
use quay_supervise::{
    CommandRunner, ContainerSupervisor, LogStream, ServicePlatform, ServiceSupervisor, Supervisor,
    SuperviseError,
};
use quay_types::{DeployMode, IdentityRef, NodeDescriptor, NodeKind, NodeState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy)]
enum IdentitySlot {
    Sign,
    Tls,
}

/// Orchestrator for one node: sequences identity issuance, material
/// generation, process supervision and channel participation.
///
/// One controller instance per node; callers serialize operations on
/// the same instance. All collaborators are explicit dependencies.
pub struct NodeController {
    descriptor: NodeDescriptor,
    root: PathBuf,
    identity: Arc<dyn IdentityProvider>,
    registry: Arc<dyn OrganizationRegistry>,
    resolver: Arc<dyn BinaryResolver>,
    runner: Arc<dyn CommandRunner>,
    audit: Arc<dyn AuditSink>,
    admin_transport: Option<Arc<dyn AdminTransport>>,
    service_platform: ServicePlatform,
    unit_dir: PathBuf,
    state: NodeState,
}

impl NodeController {
    /// Controller bound to one node's descriptor.
    ///
    /// `root` is the material root under which the node's private
    /// directory tree lives.
    pub fn new(
        descriptor: NodeDescriptor,
        root: impl Into<PathBuf>,
        identity: Arc<dyn IdentityProvider>,
        registry: Arc<dyn OrganizationRegistry>,
        resolver: Arc<dyn BinaryResolver>,
        runner: Arc<dyn CommandRunner>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let service_platform = ServicePlatform::detect();
        let unit_dir = service_platform.default_unit_dir();
        Self {
            descriptor,
            root: root.into(),
            identity,
            registry,
            resolver,
            runner,
            audit,
            admin_transport: None,
            service_platform,
            unit_dir,
            state: NodeState::Uninitialized,
        }
    }

    /// Override the service platform and unit directory (tests, or
    /// managing a foreign root)
    pub fn with_service_platform(mut self, platform: ServicePlatform, unit_dir: PathBuf) -> Self {
        self.service_platform = platform;
        self.unit_dir = unit_dir;
        self
    }

    /// Override the admin transport used for participation calls
    pub fn with_admin_transport(mut self, transport: Arc<dyn AdminTransport>) -> Self {
        self.admin_transport = Some(transport);
        self
    }

    /// The controller's current view of the descriptor
    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    /// Derived lifecycle state
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The node's directory layout
    pub fn dirs(&self) -> NodeDirs {
        NodeDirs::new(&self.root, self.descriptor.kind(), &self.descriptor.slug())
    }

    // ==================== Lifecycle Operations ====================

    /// Issue identities, write material and return the populated
    /// descriptor for persistence by the caller.
    ///
    /// Not idempotent by design: a node directory that already exists
    /// is a configuration error, never silently re-initialized.
    pub async fn init(&mut self) -> LifecycleResult<NodeDescriptor> {
        let result = self.init_inner().await;
        if matches!(
            result,
            Err(LifecycleError::Identity { .. } | LifecycleError::Filesystem { .. })
        ) {
            self.state = NodeState::Error;
        }
        self.record("init", result)
    }

    /// Resolve the binary or image for the configured version and
    /// start the node through the supervisor for its mode.
    pub async fn start(&mut self) -> LifecycleResult<()> {
        let result = self.start_inner().await;
        if matches!(result, Err(LifecycleError::Process { .. })) {
            self.state = NodeState::Error;
        }
        self.record("start", result)
    }

    /// Stop the node through the supervisor for its mode
    pub async fn stop(&mut self) -> LifecycleResult<()> {
        let result = self.stop_inner().await;
        if matches!(result, Err(LifecycleError::Process { .. })) {
            self.state = NodeState::Error;
        }
        self.record("stop", result)
    }

    /// Renew both certificates in place and restart the node.
    ///
    /// Non-transactional by design: when the restart fails after the
    /// certificates were renewed, the error is surfaced and the renewed
    /// certificates stay on disk; re-invoking [`NodeController::start`]
    /// recovers.
    ///
    /// The success audit event carries the fingerprints of the renewed
    /// certificates.
    pub async fn renew_certificates(&mut self) -> LifecycleResult<()> {
        let result = self.renew_inner().await;
        if matches!(
            result,
            Err(LifecycleError::Identity { .. }
                | LifecycleError::Filesystem { .. }
                | LifecycleError::Process { .. })
        ) {
            self.state = NodeState::Error;
        }
        if result.is_ok() {
            self.audit.record(AuditEvent {
                node: self.descriptor.slug(),
                operation: "renew-certificates".to_string(),
                outcome: AuditOutcome::Success,
                detail: self.certificate_fingerprints(),
            });
            return result;
        }
        self.record("renew-certificates", result)
    }

    /// Join the node to the channel described by a genesis or config
    /// block.
    pub async fn join_channel(&self, block: Bytes) -> LifecycleResult<ChannelInfo> {
        let result = self.join_inner(block).await;
        self.record("join-channel", result)
    }

    /// Remove the node from a channel.
    ///
    /// A peer is stopped and restarted afterwards (the platform only
    /// unregisters a channel on restart); an orderer leave is a pure
    /// protocol call.
    pub async fn leave_channel(&mut self, channel_id: &str) -> LifecycleResult<()> {
        let result = self.leave_inner(channel_id).await;
        if matches!(result, Err(LifecycleError::Process { .. })) {
            self.state = NodeState::Error;
        }
        self.record("leave-channel", result)
    }

    /// List the channels the node participates in
    pub async fn channels(&self) -> LifecycleResult<Vec<ChannelSummary>> {
        let client = self.channel_client().await?;
        client.list().await.map_err(|e| self.protocol_err(e))
    }

    /// Stream log lines from the node's output sink.
    ///
    /// Infinite while `follow` is true; cancel the returned stream (or
    /// drop it) to terminate the underlying read.
    pub async fn tail_logs(&self, tail: usize, follow: bool) -> LifecycleResult<LogStream> {
        let supervisor = self.supervisor().await?;
        supervisor.tail_logs(tail, follow).await.map_err(|e| match e {
            SuperviseError::LogsUnavailable => LifecycleError::LogsUnavailable {
                node: self.descriptor.slug(),
            },
            other => self.process_err(other),
        })
    }

    // ==================== Operation Bodies ====================

    async fn init_inner(&mut self) -> LifecycleResult<NodeDescriptor> {
        let dirs = self.dirs();
        if dirs.exists() {
            return Err(LifecycleError::Configuration {
                node: self.descriptor.slug(),
                detail: format!(
                    "node directory {} already exists; init is not idempotent",
                    dirs.node_dir().display()
                ),
            });
        }

        let org = self.organization().await?;

        let (domains, ip_sans) = {
            let base = self.descriptor.base();
            normalize_sans(&base.domains, &base.ip_sans)
        };
        {
            let base = self.descriptor.base_mut();
            base.domains = domains.clone();
            base.ip_sans = ip_sans.clone();
        }

        let request = CertRequest::new(self.descriptor.slug(), domains, ip_sans);
        let sign_ref = self.issue_identity(org.sign_ca_key_id, &request).await?;
        let tls_ref = self.issue_identity(org.tls_ca_key_id, &request).await?;
        {
            let base = self.descriptor.base_mut();
            base.sign_identity = Some(sign_ref);
            base.tls_identity = Some(tls_ref);
        }

        dirs.create().map_err(|e| self.filesystem_err(e))?;
        self.write_material(&org).await?;

        self.state = NodeState::Initialized;
        info!(node = self.descriptor.slug(), "node initialized");
        Ok(self.descriptor.clone())
    }

    async fn start_inner(&mut self) -> LifecycleResult<()> {
        let supervisor = self.supervisor().await?;
        supervisor.start().await.map_err(|e| self.process_err(e))?;
        self.state = NodeState::Running;
        Ok(())
    }

    async fn stop_inner(&mut self) -> LifecycleResult<()> {
        let supervisor = self.supervisor().await?;
        self.state = NodeState::Stopping;
        supervisor.stop().await.map_err(|e| self.process_err(e))?;
        self.state = NodeState::Stopped;
        Ok(())
    }

    async fn renew_inner(&mut self) -> LifecycleResult<()> {
        self.stop_inner().await?;

        let org = self.organization().await?;
        self.renew_identity(IdentitySlot::Sign, org.sign_ca_key_id)
            .await?;
        self.renew_identity(IdentitySlot::Tls, org.tls_ca_key_id)
            .await?;
        self.write_material(&org).await?;
        info!(node = self.descriptor.slug(), "certificates renewed");

        // Restart failures past this point leave the renewed
        // certificates in place; the caller retries start().
        self.start_inner().await
    }

    async fn join_inner(&self, block: Bytes) -> LifecycleResult<ChannelInfo> {
        let client = self.channel_client().await?;
        client.join(block).await.map_err(|e| self.protocol_err(e))
    }

    async fn leave_inner(&mut self, channel_id: &str) -> LifecycleResult<()> {
        let client = self.channel_client().await?;
        client
            .leave(channel_id)
            .await
            .map_err(|e| self.protocol_err(e))?;

        if self.descriptor.kind() == NodeKind::Peer {
            self.stop_inner().await?;
            self.start_inner().await?;
        }
        Ok(())
    }

    // ==================== Steps ====================

    async fn organization(&self) -> LifecycleResult<Organization> {
        let id = self.descriptor.base().organization_id;
        self.registry
            .organization(id)
            .await
            .map_err(|e| self.identity_err(e))
    }

    async fn issue_identity(
        &self,
        ca_key_id: u64,
        request: &CertRequest,
    ) -> LifecycleResult<IdentityRef> {
        let key = self
            .identity
            .create_key(KeyAlgorithm::default(), None)
            .await
            .map_err(|e| self.identity_err(e))?;
        let signed = self
            .identity
            .sign_certificate(key.key_id, ca_key_id, request)
            .await
            .map_err(|e| self.identity_err(e))?;
        self.identity
            .set_signing_key_id(key.key_id, ca_key_id)
            .await
            .map_err(|e| self.identity_err(e))?;
        Ok(IdentityRef {
            key_id: key.key_id,
            cert_pem: signed.cert_pem,
            ca_key_id: Some(ca_key_id),
        })
    }

    async fn renew_identity(&mut self, slot: IdentitySlot, ca_key_id: u64) -> LifecycleResult<()> {
        let (domains, ip_sans) = {
            let base = self.descriptor.base();
            (base.domains.clone(), base.ip_sans.clone())
        };
        let mut identity_ref = match slot {
            IdentitySlot::Sign => self.descriptor.base().sign_identity.clone(),
            IdentitySlot::Tls => self.descriptor.base().tls_identity.clone(),
        }
        .ok_or_else(|| LifecycleError::Configuration {
            node: self.descriptor.slug(),
            detail: "identity missing; node was never initialized".to_string(),
        })?;

        // Legacy descriptors may predate recorded signing-CA
        // references; associate the organization CA before renewing.
        if identity_ref.ca_key_id.is_none() {
            self.identity
                .set_signing_key_id(identity_ref.key_id, ca_key_id)
                .await
                .map_err(|e| self.identity_err(e))?;
            identity_ref.ca_key_id = Some(ca_key_id);
        }

        // Same key pair, same SAN list, fresh one-year window.
        let request = CertRequest::new(self.descriptor.slug(), domains, ip_sans);
        let signed = self
            .identity
            .renew_certificate(identity_ref.key_id, &request)
            .await
            .map_err(|e| self.identity_err(e))?;
        identity_ref.cert_pem = signed.cert_pem;

        let base = self.descriptor.base_mut();
        match slot {
            IdentitySlot::Sign => base.sign_identity = Some(identity_ref),
            IdentitySlot::Tls => base.tls_identity = Some(identity_ref),
        }
        Ok(())
    }

    async fn write_material(&self, org: &Organization) -> LifecycleResult<MaterialPaths> {
        let base = self.descriptor.base();
        let sign = base
            .sign_identity
            .as_ref()
            .ok_or_else(|| self.missing("signing identity"))?;
        let tls = base
            .tls_identity
            .as_ref()
            .ok_or_else(|| self.missing("tls identity"))?;

        let sign_key_pem = self
            .identity
            .decrypted_private_key(sign.key_id)
            .await
            .map_err(|e| self.identity_err(e))?;
        let tls_key_pem = self
            .identity
            .decrypted_private_key(tls.key_id)
            .await
            .map_err(|e| self.identity_err(e))?;

        let dirs = self.dirs();
        let inputs = MaterialInputs {
            descriptor: &self.descriptor,
            sign_cert_pem: &sign.cert_pem,
            sign_key_pem: &sign_key_pem,
            tls_cert_pem: &tls.cert_pem,
            tls_key_pem: &tls_key_pem,
            sign_ca_cert_pem: &org.sign_ca_cert_pem,
            tls_ca_cert_pem: &org.tls_ca_cert_pem,
        };
        write_node_material(&dirs, &inputs).map_err(|e| self.filesystem_err(e))
    }

    async fn supervisor(&self) -> LifecycleResult<Box<dyn Supervisor>> {
        let mode = self.descriptor.mode().map_err(|_| {
            LifecycleError::UnsupportedMode {
                node: self.descriptor.slug(),
                mode: self.descriptor.base().mode.clone(),
            }
        })?;
        let dirs = self.dirs();
        let supervisor: Box<dyn Supervisor> = match mode {
            DeployMode::Service => {
                let binary = self
                    .resolver
                    .binary_path(self.descriptor.kind(), &self.descriptor.base().version)
                    .await?;
                let plan = build_launch_plan(&self.descriptor, &dirs, mode, Some(binary), None);
                Box::new(ServiceSupervisor::with_platform(
                    plan,
                    Arc::clone(&self.runner),
                    self.service_platform,
                    self.unit_dir.clone(),
                ))
            }
            DeployMode::Container => {
                let plan = build_launch_plan(
                    &self.descriptor,
                    &dirs,
                    mode,
                    None,
                    Some(default_image(&self.descriptor)),
                );
                Box::new(ContainerSupervisor::new(plan, Arc::clone(&self.runner)))
            }
        };
        Ok(supervisor)
    }

    async fn channel_client(&self) -> LifecycleResult<ChannelClient> {
        if let Some(transport) = &self.admin_transport {
            return Ok(ChannelClient::with_transport(Arc::clone(transport)));
        }
        let base = self.descriptor.base();
        let tls = base
            .tls_identity
            .as_ref()
            .ok_or_else(|| self.missing("tls identity"))?;
        let org = self.organization().await?;
        let client_key_pem = self
            .identity
            .decrypted_private_key(tls.key_id)
            .await
            .map_err(|e| self.identity_err(e))?;
        Ok(ChannelClient::connect(
            &base.admin.to_string(),
            TlsIdentity {
                client_cert_pem: tls.cert_pem.clone(),
                client_key_pem,
                server_ca_pem: org.tls_ca_cert_pem.clone(),
            },
        ))
    }

    // ==================== Error Context / Audit ====================

    fn identity_err(&self, source: IdentityError) -> LifecycleError {
        LifecycleError::Identity {
            node: self.descriptor.slug(),
            source,
        }
    }

    fn filesystem_err(&self, source: MaterialError) -> LifecycleError {
        LifecycleError::Filesystem {
            node: self.descriptor.slug(),
            source,
        }
    }

    fn process_err(&self, source: SuperviseError) -> LifecycleError {
        LifecycleError::Process {
            node: self.descriptor.slug(),
            source,
        }
    }

    fn protocol_err(&self, source: quay_channel::ChannelError) -> LifecycleError {
        LifecycleError::Protocol {
            node: self.descriptor.slug(),
            source,
        }
    }

    fn certificate_fingerprints(&self) -> Option<String> {
        let base = self.descriptor.base();
        let sign = base.sign_identity.as_ref()?;
        let tls = base.tls_identity.as_ref()?;
        Some(format!(
            "sign={} tls={}",
            cert_fingerprint(&sign.cert_pem),
            cert_fingerprint(&tls.cert_pem)
        ))
    }

    fn missing(&self, what: &str) -> LifecycleError {
        LifecycleError::Configuration {
            node: self.descriptor.slug(),
            detail: format!("{what} missing; node was never initialized"),
        }
    }

    fn record<T>(&self, operation: &str, result: LifecycleResult<T>) -> LifecycleResult<T> {
        let (outcome, detail) = match &result {
            Ok(_) => (AuditOutcome::Success, None),
            Err(e) => (AuditOutcome::Failure, Some(e.to_string())),
        };
        self.audit.record(AuditEvent {
            node: self.descriptor.slug(),
            operation: operation.to_string(),
            outcome,
            detail,
        });
        result
    }
}
