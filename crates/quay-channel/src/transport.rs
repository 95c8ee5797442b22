//! Admin transport: mutual-TLS HTTP and a mock for tests

use crate::{ChannelError, ChannelResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Client-side TLS material for the admin connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsIdentity {
    /// Admin client certificate, PEM
    pub client_cert_pem: String,
    /// Admin client private key, PEM
    pub client_key_pem: String,
    /// CA certificate that signed the node's server certificate, PEM
    pub server_ca_pem: String,
}

/// Object-safe transport for administrative calls.
///
/// Implementations open and close one connection per call; nothing is
/// pooled or kept alive between calls.
#[async_trait]
pub trait AdminTransport: Send + Sync {
    /// GET a resource, returning the raw body
    async fn get(&self, path: &str) -> ChannelResult<Bytes>;

    /// POST a block payload as a multipart form (join-style calls)
    async fn post_block(&self, path: &str, block: Bytes) -> ChannelResult<Bytes>;

    /// POST raw bytes (signed envelope submission)
    async fn post_bytes(&self, path: &str, body: Bytes) -> ChannelResult<Bytes>;

    /// DELETE a resource
    async fn delete(&self, path: &str) -> ChannelResult<()>;
}

// Lets tests hand a shared mock to the client while keeping a handle
// for assertions.
#[async_trait]
impl<T: AdminTransport + ?Sized> AdminTransport for Arc<T> {
    async fn get(&self, path: &str) -> ChannelResult<Bytes> {
        (**self).get(path).await
    }

    async fn post_block(&self, path: &str, block: Bytes) -> ChannelResult<Bytes> {
        (**self).post_block(path, block).await
    }

    async fn post_bytes(&self, path: &str, body: Bytes) -> ChannelResult<Bytes> {
        (**self).post_bytes(path, body).await
    }

    async fn delete(&self, path: &str) -> ChannelResult<()> {
        (**self).delete(path).await
    }
}

/// HTTPS transport with mutual TLS against the node's admin endpoint.
///
/// A fresh `reqwest::Client` is built per call so every request gets
/// its own connection, matching the one-shot semantics of the admin
/// protocol.
pub struct HttpAdminTransport {
    base_url: String,
    identity: TlsIdentity,
}

impl HttpAdminTransport {
    /// Transport for `https://<admin-host>:<admin-port>`
    pub fn new(admin_address: &str, identity: TlsIdentity) -> Self {
        Self {
            base_url: format!("https://{admin_address}"),
            identity,
        }
    }

    fn client(&self) -> ChannelResult<reqwest::Client> {
        let mut identity_pem = self.identity.client_cert_pem.clone();
        identity_pem.push_str(&self.identity.client_key_pem);
        let identity = reqwest::Identity::from_pem(identity_pem.as_bytes())
            .map_err(|e| ChannelError::Tls(e.to_string()))?;
        let ca = reqwest::Certificate::from_pem(self.identity.server_ca_pem.as_bytes())
            .map_err(|e| ChannelError::Tls(e.to_string()))?;
        reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .add_root_certificate(ca)
            .build()
            .map_err(|e| ChannelError::Tls(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_response(path: &str, response: reqwest::Response) -> ChannelResult<Bytes> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChannelError::Transport {
                path: path.to_string(),
                detail: e.to_string(),
            })?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ChannelError::Api {
                status: status.as_u16(),
                path: path.to_string(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            })
        }
    }

    fn transport_err(path: &str, e: reqwest::Error) -> ChannelError {
        ChannelError::Transport {
            path: path.to_string(),
            detail: e.to_string(),
        }
    }
}

#[async_trait]
impl AdminTransport for HttpAdminTransport {
    async fn get(&self, path: &str) -> ChannelResult<Bytes> {
        let response = self
            .client()?
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Self::transport_err(path, e))?;
        Self::read_response(path, response).await
    }

    async fn post_block(&self, path: &str, block: Bytes) -> ChannelResult<Bytes> {
        let part = reqwest::multipart::Part::bytes(block.to_vec())
            .file_name("config-block.pb")
            .mime_str("application/octet-stream")
            .map_err(|e| Self::transport_err(path, e))?;
        let form = reqwest::multipart::Form::new().part("config-block", part);
        let response = self
            .client()?
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport_err(path, e))?;
        Self::read_response(path, response).await
    }

    async fn post_bytes(&self, path: &str, body: Bytes) -> ChannelResult<Bytes> {
        let response = self
            .client()?
            .post(self.url(path))
            .header("content-type", "application/octet-stream")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| Self::transport_err(path, e))?;
        Self::read_response(path, response).await
    }

    async fn delete(&self, path: &str) -> ChannelResult<()> {
        let response = self
            .client()?
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| Self::transport_err(path, e))?;
        Self::read_response(path, response).await.map(|_| ())
    }
}

/// One request observed by the mock transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: &'static str,
    /// Request path
    pub path: String,
    /// Request body, when one was sent
    pub body: Option<Bytes>,
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    responses: HashMap<String, Bytes>,
    failures: HashMap<String, (u16, String)>,
}

/// In-memory transport for tests: canned responses and injectable API
/// failures, keyed by request path.
#[derive(Default)]
pub struct MockAdminTransport {
    state: Mutex<MockState>,
}

impl MockAdminTransport {
    /// Create an empty mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned raw response for a path
    pub fn set_response(&self, path: &str, body: impl Into<Bytes>) {
        self.state
            .lock()
            .responses
            .insert(path.to_string(), body.into());
    }

    /// Canned JSON response for a path
    pub fn set_json(&self, path: &str, value: serde_json::Value) {
        self.set_response(path, Bytes::from(value.to_string()));
    }

    /// Make a path answer with an API error
    pub fn fail_with(&self, path: &str, status: u16, message: &str) {
        self.state
            .lock()
            .failures
            .insert(path.to_string(), (status, message.to_string()));
    }

    /// Requests observed so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Bytes>,
    ) -> ChannelResult<Bytes> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        if let Some((status, message)) = state.failures.get(path) {
            return Err(ChannelError::Api {
                status: *status,
                path: path.to_string(),
                message: message.clone(),
            });
        }
        Ok(state
            .responses
            .get(path)
            .cloned()
            .unwrap_or_else(Bytes::new))
    }
}

#[async_trait]
impl AdminTransport for MockAdminTransport {
    async fn get(&self, path: &str) -> ChannelResult<Bytes> {
        self.respond("GET", path, None)
    }

    async fn post_block(&self, path: &str, block: Bytes) -> ChannelResult<Bytes> {
        self.respond("POST", path, Some(block))
    }

    async fn post_bytes(&self, path: &str, body: Bytes) -> ChannelResult<Bytes> {
        self.respond("POST", path, Some(body))
    }

    async fn delete(&self, path: &str) -> ChannelResult<()> {
        self.respond("DELETE", path, None).map(|_| ())
    }
}
