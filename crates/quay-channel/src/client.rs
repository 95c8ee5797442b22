//! Channel participation client

use crate::transport::{AdminTransport, HttpAdminTransport, TlsIdentity};
use crate::types::{BlockRef, ChannelInfo, ChannelSummary};
use crate::{ChannelError, ChannelResult};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

const CHANNELS_PATH: &str = "/participation/v1/channels";

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    channels: Vec<ChannelSummary>,
}

/// Administrative client bound to one node's admin endpoint.
///
/// Every operation is synchronous request/response over its own
/// connection. Block-range fetches are fully consumed before returning.
pub struct ChannelClient {
    transport: Box<dyn AdminTransport>,
}

impl ChannelClient {
    /// Client over mutual-TLS HTTP against `admin_address`
    pub fn connect(admin_address: &str, identity: TlsIdentity) -> Self {
        Self {
            transport: Box::new(HttpAdminTransport::new(admin_address, identity)),
        }
    }

    /// Client over a custom transport (tests)
    pub fn with_transport(transport: impl AdminTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(path: &str, body: &Bytes) -> ChannelResult<T> {
        serde_json::from_slice(body).map_err(|e| ChannelError::Decode {
            path: path.to_string(),
            detail: e.to_string(),
        })
    }

    /// Join the node to the channel described by a genesis or config
    /// block.
    pub async fn join(&self, block: Bytes) -> ChannelResult<ChannelInfo> {
        debug!(bytes = block.len(), "submitting join block");
        let body = self.transport.post_block(CHANNELS_PATH, block).await?;
        Self::decode(CHANNELS_PATH, &body)
    }

    /// Remove the node from a channel
    pub async fn leave(&self, channel_id: &str) -> ChannelResult<()> {
        let path = format!("{CHANNELS_PATH}/{channel_id}");
        self.transport.delete(&path).await
    }

    /// List the channels the node participates in
    pub async fn list(&self) -> ChannelResult<Vec<ChannelSummary>> {
        let body = self.transport.get(CHANNELS_PATH).await?;
        let list: ChannelList = Self::decode(CHANNELS_PATH, &body)?;
        Ok(list.channels)
    }

    /// Current height and hash chain tip of one channel
    pub async fn info(&self, channel_id: &str) -> ChannelResult<ChannelInfo> {
        let path = format!("{CHANNELS_PATH}/{channel_id}");
        let body = self.transport.get(&path).await?;
        Self::decode(&path, &body)
    }

    /// Fetch a single block by number, hash or transaction id
    pub async fn block(&self, channel_id: &str, selector: &BlockRef) -> ChannelResult<Bytes> {
        let path = format!(
            "{CHANNELS_PATH}/{channel_id}/blocks/{}",
            selector.path_segment()
        );
        self.transport.get(&path).await
    }

    /// Fetch an inclusive, bounded range of blocks.
    ///
    /// The whole range is materialized before returning; the first
    /// failing fetch aborts the read.
    pub async fn block_range(
        &self,
        channel_id: &str,
        from: u64,
        to: u64,
    ) -> ChannelResult<Vec<Bytes>> {
        let mut blocks = Vec::new();
        for number in from..=to {
            blocks.push(self.block(channel_id, &BlockRef::Number(number)).await?);
        }
        Ok(blocks)
    }

    /// Fetch the channel's current configuration envelope
    pub async fn config_envelope(&self, channel_id: &str) -> ChannelResult<Bytes> {
        let path = format!("{CHANNELS_PATH}/{channel_id}/config");
        self.transport.get(&path).await
    }

    /// Submit a signed configuration-update envelope to the ordering
    /// service.
    pub async fn submit_config_update(
        &self,
        channel_id: &str,
        envelope: Bytes,
    ) -> ChannelResult<()> {
        let path = format!("{CHANNELS_PATH}/{channel_id}/config-update");
        self.transport.post_bytes(&path, envelope).await.map(|_| ())
    }
}
