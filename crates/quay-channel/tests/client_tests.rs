//! Integration tests for the channel participation client
//!
//! All requests go through the mock transport; these tests pin the
//! request shapes and the decoding of admin responses.

use bytes::Bytes;
use quay_channel::{BlockRef, ChannelClient, ChannelError, MockAdminTransport};
use serde_json::json;
use std::sync::Arc;

fn mock_client() -> (Arc<MockAdminTransport>, ChannelClient) {
    let transport = Arc::new(MockAdminTransport::new());
    let client = ChannelClient::with_transport(Arc::clone(&transport));
    (transport, client)
}

// ==================== Join / Leave Tests ====================

#[tokio::test]
async fn test_join_posts_block_to_channels_collection() {
    let (transport, client) = mock_client();
    transport.set_json(
        "/participation/v1/channels",
        json!({"name": "orders", "height": 1, "blockHash": "ab12", "status": "active"}),
    );

    let info = client.join(Bytes::from_static(b"genesis")).await.unwrap();
    assert_eq!(info.name, "orders");
    assert_eq!(info.height, 1);

    let reqs = transport.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].method, "POST");
    assert_eq!(reqs[0].path, "/participation/v1/channels");
    assert_eq!(reqs[0].body.as_deref(), Some(&b"genesis"[..]));
}

#[tokio::test]
async fn test_leave_deletes_channel_resource() {
    let (transport, client) = mock_client();

    client.leave("orders").await.unwrap();

    let reqs = transport.requests();
    assert_eq!(reqs[0].method, "DELETE");
    assert_eq!(reqs[0].path, "/participation/v1/channels/orders");
}

// ==================== Introspection Tests ====================

#[tokio::test]
async fn test_list_decodes_channel_summaries() {
    let (transport, client) = mock_client();
    transport.set_json(
        "/participation/v1/channels",
        json!({"channels": [
            {"name": "orders", "url": "/participation/v1/channels/orders"},
            {"name": "billing"}
        ]}),
    );

    let channels = client.list().await.unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, "orders");
    assert_eq!(channels[1].url, "");
}

#[tokio::test]
async fn test_info_decodes_height_and_hash() {
    let (transport, client) = mock_client();
    transport.set_json(
        "/participation/v1/channels/orders",
        json!({"name": "orders", "height": 42, "blockHash": "deadbeef", "status": "active"}),
    );

    let info = client.info("orders").await.unwrap();
    assert_eq!(info.height, 42);
    assert_eq!(info.block_hash, "deadbeef");
}

#[tokio::test]
async fn test_block_selectors_map_to_paths() {
    let (transport, client) = mock_client();
    transport.set_response("/participation/v1/channels/orders/blocks/7", &b"b7"[..]);
    transport.set_response("/participation/v1/channels/orders/blocks/hash/ff00", &b"bh"[..]);
    transport.set_response("/participation/v1/channels/orders/blocks/tx/tx9", &b"bt"[..]);

    assert_eq!(
        client.block("orders", &BlockRef::Number(7)).await.unwrap(),
        Bytes::from_static(b"b7")
    );
    assert_eq!(
        client
            .block("orders", &BlockRef::Hash("ff00".to_string()))
            .await
            .unwrap(),
        Bytes::from_static(b"bh")
    );
    assert_eq!(
        client
            .block("orders", &BlockRef::Tx("tx9".to_string()))
            .await
            .unwrap(),
        Bytes::from_static(b"bt")
    );
}

#[tokio::test]
async fn test_block_range_is_inclusive_and_ordered() {
    let (transport, client) = mock_client();
    for n in 3..=5 {
        transport.set_response(
            &format!("/participation/v1/channels/orders/blocks/{n}"),
            Bytes::from(format!("block-{n}")),
        );
    }

    let blocks = client.block_range("orders", 3, 5).await.unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], Bytes::from_static(b"block-3"));
    assert_eq!(blocks[2], Bytes::from_static(b"block-5"));
}

#[tokio::test]
async fn test_block_range_aborts_on_first_failing_fetch() {
    let (transport, client) = mock_client();
    transport.fail_with(
        "/participation/v1/channels/orders/blocks/0",
        404,
        "no such block",
    );

    // The degenerate full-u64 range must fail fast on block 0, not
    // pre-size a buffer for the whole range.
    let err = client.block_range("orders", 0, u64::MAX).await.unwrap_err();
    assert!(matches!(err, ChannelError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_config_update_submission() {
    let (transport, client) = mock_client();

    client.config_envelope("orders").await.unwrap();
    client
        .submit_config_update("orders", Bytes::from_static(b"envelope"))
        .await
        .unwrap();

    let reqs = transport.requests();
    assert_eq!(reqs[0].path, "/participation/v1/channels/orders/config");
    assert_eq!(reqs[1].path, "/participation/v1/channels/orders/config-update");
    assert_eq!(reqs[1].body.as_deref(), Some(&b"envelope"[..]));
}

// ==================== Error Mapping Tests ====================

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let (transport, client) = mock_client();
    transport.fail_with(
        "/participation/v1/channels/orders",
        404,
        "channel does not exist",
    );

    let err = client.info("orders").await.unwrap_err();
    assert_eq!(
        err,
        ChannelError::Api {
            status: 404,
            path: "/participation/v1/channels/orders".to_string(),
            message: "channel does not exist".to_string(),
        }
    );
}

#[tokio::test]
async fn test_decode_error_on_malformed_body() {
    let (transport, client) = mock_client();
    transport.set_response("/participation/v1/channels", &b"not json"[..]);

    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ChannelError::Decode { .. }));
}
