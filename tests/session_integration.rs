//! Member session tests over in-memory connections
//!
//! Each session runs the real reader/writer pair against a mock endpoint, so
//! these cover the wire payload, self-delivery and teardown ordering.

mod common;

use std::time::Duration;

use room_relay::group::{DeliveryPolicy, GroupRegistry, GroupSettings};
use room_relay::websocket::{run_session, ChatMessage, SessionEnd};

use common::{broken_connection, mock_connection, wait_for_members};

fn registry() -> GroupRegistry {
    GroupRegistry::new(GroupSettings {
        request_buffer_size: 16,
        message_buffer_size: 256,
        delivery_policy: DeliveryPolicy::Block,
    })
}

#[tokio::test]
async fn test_lobby_message_reaches_every_member_including_sender() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");

    let (mut alice, alice_source, alice_sink) = mock_connection();
    let (mut bob, bob_source, bob_sink) = mock_connection();
    let alice_session = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, alice_source, alice_sink));
    let bob_session = tokio::spawn(run_session(lobby.clone(), "B".into(), 256, bob_source, bob_sink));
    wait_for_members(&lobby, 2).await;

    alice.send_text("hi");

    let expected = ChatMessage::new("A", "hi");
    assert_eq!(bob.next_message().await, Some(expected.clone()));
    assert_eq!(alice.next_message().await, Some(expected));

    // Exactly once
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(alice.drain_now().is_empty());
    assert!(bob.drain_now().is_empty());

    alice.disconnect();
    bob.disconnect();
    assert_eq!(alice_session.await.unwrap().frames_received, 1);
    assert_eq!(bob_session.await.unwrap().frames_sent, 1);
}

#[tokio::test]
async fn test_client_close_leaves_group_and_closes_connection() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");

    let (mut alice, source, sink) = mock_connection();
    let session = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, source, sink));
    wait_for_members(&lobby, 1).await;

    alice.disconnect();
    let summary = session.await.unwrap();

    assert_eq!(summary.ended_by, SessionEnd::ClientClosed);
    assert!(alice.is_closed());
    assert!(lobby.members().await.unwrap().is_empty());

    // Later broadcasts neither fail nor target the departed member
    let report = lobby.broadcast_and_wait("anyone?").await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.dropped, 0);
}

#[tokio::test]
async fn test_read_failure_tears_down_only_that_member() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");

    let (alice, alice_source, alice_sink) = mock_connection();
    let (mut bob, bob_source, bob_sink) = mock_connection();
    let alice_session = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, alice_source, alice_sink));
    let _bob_session = tokio::spawn(run_session(lobby.clone(), "B".into(), 256, bob_source, bob_sink));
    wait_for_members(&lobby, 2).await;

    alice.fail_read();
    let summary = alice_session.await.unwrap();
    assert_eq!(summary.ended_by, SessionEnd::ReceiveFailed);
    assert!(alice.is_closed());

    let members = lobby.members().await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "B");

    bob.send_text("still here");
    assert_eq!(bob.next_message().await, Some(ChatMessage::new("B", "still here")));
}

#[tokio::test]
async fn test_write_failure_ends_session() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");

    let (_client, source, sink) = broken_connection();
    let session = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, source, sink));
    wait_for_members(&lobby, 1).await;

    // The writer fails on the first frame it tries to deliver
    lobby.broadcast("ping").await.unwrap();
    let summary = tokio::time::timeout(Duration::from_secs(2), session)
        .await
        .expect("session should end after a write failure")
        .unwrap();

    assert_eq!(summary.ended_by, SessionEnd::WriterStopped);
    assert_eq!(summary.frames_sent, 0);
    assert!(lobby.members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_message_text_is_relayed_uninterpreted() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");

    let (mut alice, source, sink) = mock_connection();
    let _session = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, source, sink));
    wait_for_members(&lobby, 1).await;

    alice.send_text("{\"not\": \"parsed\"}");
    let message = alice.next_message().await.unwrap();
    assert_eq!(message.message, "{\"not\": \"parsed\"}");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let registry = registry();
    let lobby = registry.get_or_create("lobby");
    let games = registry.get_or_create("games");

    let (mut alice, a_source, a_sink) = mock_connection();
    let (mut bob, b_source, b_sink) = mock_connection();
    let _a = tokio::spawn(run_session(lobby.clone(), "A".into(), 256, a_source, a_sink));
    let _b = tokio::spawn(run_session(games.clone(), "B".into(), 256, b_source, b_sink));
    wait_for_members(&lobby, 1).await;
    wait_for_members(&games, 1).await;

    alice.send_text("lobby only");
    assert_eq!(alice.next_message().await.unwrap().message, "lobby only");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(bob.drain_now().is_empty());
}
