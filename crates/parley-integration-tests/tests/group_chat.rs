//! Integration test: group creation, live message fan-out, history.
//!
//! Alice creates a group with Bob and Carol. Both online participants
//! see the new conversation; a message from Alice reaches both live
//! with no echo to her; history then renders the sent line.

use parley_integration_tests::{login_fresh_user, TestServer};
use parley_proto::message::{ClientMessage, ServerMessage};
use parley_proto::payload::{
    CreateConvPayload, ReqMembersPayload, RequestHistoryPayload, SendMessagePayload,
};
use parley_proto::types::{ConvType, Role};

#[tokio::test]
async fn group_create_and_message_fanout() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, alice_info) = login_fresh_user(server.addr, "a@x", "alice").await?;
    let (mut bob, bob_info) = login_fresh_user(server.addr, "b@x", "bob").await?;
    let (mut carol, carol_info) = login_fresh_user(server.addr, "c@x", "carol").await?;

    // Alice creates the group; she is uids[0] and becomes admin.
    alice
        .send(&ClientMessage::CreateConv(CreateConvPayload {
            conv_type: ConvType::Group,
            name: "team".into(),
            description: String::new(),
            participant_uids: vec![alice_info.uid, bob_info.uid, carol_info.uid],
        }))
        .await?;

    let conv_id = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };

    // Bob and Carol each get a conversation refresh including the group.
    for (client, name) in [(&mut bob, "bob"), (&mut carol, "carol")] {
        match client.recv().await? {
            ServerMessage::Conversations(convs) => {
                let group = convs
                    .iter()
                    .find(|c| c.conv_id == conv_id)
                    .unwrap_or_else(|| panic!("{name} missing the new group"));
                assert_eq!(group.name, "team");
                assert_eq!(group.my_role, Role::Member);
            }
            other => panic!("expected Conversations for {name}, got {other:?}"),
        }
    }

    // Alice sends a message.
    alice
        .send(&ClientMessage::SendText(SendMessagePayload {
            conv_id,
            text: "hello".into(),
        }))
        .await?;

    for (client, name) in [(&mut bob, "bob"), (&mut carol, "carol")] {
        match client.recv().await? {
            ServerMessage::RoutedText(routed) => {
                assert_eq!(routed.conv_id, conv_id);
                assert_eq!(routed.sender_uid, alice_info.uid);
                assert_eq!(routed.sender_username, "alice");
                assert_eq!(routed.text, "hello");
            }
            other => panic!("expected RoutedText for {name}, got {other:?}"),
        }
    }

    // No echo to the sender.
    alice.expect_silence().await?;

    // History renders the line as "[HH:MM] alice: hello\n".
    alice
        .send(&ClientMessage::ReqHistory(RequestHistoryPayload { conv_id }))
        .await?;
    match alice.recv().await? {
        ServerMessage::History(text) => {
            assert!(text.starts_with('['));
            assert!(text.ends_with("] alice: hello\n"));
        }
        other => panic!("expected History, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn member_roster_reports_roles() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, alice_info) = login_fresh_user(server.addr, "a@x", "alice").await?;
    let (mut bob, bob_info) = login_fresh_user(server.addr, "b@x", "bob").await?;

    alice
        .send(&ClientMessage::CreateConv(CreateConvPayload {
            conv_type: ConvType::Group,
            name: "team".into(),
            description: String::new(),
            participant_uids: vec![alice_info.uid, bob_info.uid],
        }))
        .await?;
    let conv_id = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };
    let _bob_refresh = bob.recv().await?;

    bob.send(&ClientMessage::ReqMembers(ReqMembersPayload { conv_id }))
        .await?;
    match bob.recv().await? {
        ServerMessage::Members(members) => {
            assert_eq!(members.len(), 2);
            let admin = members.iter().find(|m| m.uid == alice_info.uid);
            let member = members.iter().find(|m| m.uid == bob_info.uid);
            assert_eq!(admin.map(|m| m.role), Some(Role::Admin));
            assert_eq!(member.map(|m| m.role), Some(Role::Member));
        }
        other => panic!("expected Members, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn non_participant_cannot_send_or_read() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, alice_info) = login_fresh_user(server.addr, "a@x", "alice").await?;
    let (mut bob, bob_info) = login_fresh_user(server.addr, "b@x", "bob").await?;
    let (mut mallory, _mallory_info) = login_fresh_user(server.addr, "m@x", "mallory").await?;

    alice
        .send(&ClientMessage::CreateConv(CreateConvPayload {
            conv_type: ConvType::Group,
            name: "team".into(),
            description: String::new(),
            participant_uids: vec![alice_info.uid, bob_info.uid],
        }))
        .await?;
    let conv_id = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };
    let _bob_refresh = bob.recv().await?;

    // Mallory is not a participant: injection, roster, and history all
    // drop silently.
    mallory
        .send(&ClientMessage::SendText(SendMessagePayload {
            conv_id,
            text: "intruding".into(),
        }))
        .await?;
    mallory
        .send(&ClientMessage::ReqHistory(RequestHistoryPayload { conv_id }))
        .await?;
    mallory
        .send(&ClientMessage::ReqMembers(ReqMembersPayload { conv_id }))
        .await?;
    mallory.expect_silence().await?;

    // Nothing reached the participants either.
    bob.expect_silence().await?;

    // And nothing was persisted.
    alice
        .send(&ClientMessage::ReqHistory(RequestHistoryPayload { conv_id }))
        .await?;
    match alice.recv().await? {
        ServerMessage::History(text) => assert!(text.is_empty()),
        other => panic!("expected History, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn admin_adds_member_by_friend_code() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, alice_info) = login_fresh_user(server.addr, "a@x", "alice").await?;
    let (mut bob, bob_info) = login_fresh_user(server.addr, "b@x", "bob").await?;

    // A group of one.
    alice
        .send(&ClientMessage::CreateConv(CreateConvPayload {
            conv_type: ConvType::Group,
            name: "team".into(),
            description: String::new(),
            participant_uids: vec![alice_info.uid],
        }))
        .await?;
    let conv_id = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };

    // Non-admin Bob cannot add himself.
    bob.send(&ClientMessage::AddMember(parley_proto::payload::AddMemberPayload {
        conv_id,
        target_friend_code: bob_info.friend_code.clone(),
    }))
    .await?;
    bob.expect_silence().await?;

    // Admin adds Bob: caller gets MemberAdded, then everyone a refresh.
    alice
        .send(&ClientMessage::AddMember(parley_proto::payload::AddMemberPayload {
            conv_id,
            target_friend_code: bob_info.friend_code.clone(),
        }))
        .await?;
    assert_eq!(alice.recv().await?, ServerMessage::MemberAdded);
    match alice.recv().await? {
        ServerMessage::Conversations(convs) => {
            assert!(convs.iter().any(|c| c.conv_id == conv_id));
        }
        other => panic!("expected Conversations for alice, got {other:?}"),
    }
    match bob.recv().await? {
        ServerMessage::Conversations(convs) => {
            let group = convs.iter().find(|c| c.conv_id == conv_id);
            assert_eq!(group.map(|c| c.my_role), Some(Role::Member));
        }
        other => panic!("expected Conversations for bob, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn private_create_reuses_existing_room() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, alice_info) = login_fresh_user(server.addr, "a@x", "alice").await?;
    let (mut bob, bob_info) = login_fresh_user(server.addr, "b@x", "bob").await?;

    let create = ClientMessage::CreateConv(CreateConvPayload {
        conv_type: ConvType::Private,
        name: "Private Chat".into(),
        description: String::new(),
        participant_uids: vec![alice_info.uid, bob_info.uid],
    });

    alice.send(&create).await?;
    let first = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };
    let _bob_refresh = bob.recv().await?;

    // Repeat: same id, and nobody gets re-notified.
    alice.send(&create).await?;
    let second = match alice.recv().await? {
        ServerMessage::ConvCreated(id) => id,
        other => panic!("expected ConvCreated, got {other:?}"),
    };
    assert_eq!(first, second);
    bob.expect_silence().await?;
    Ok(())
}
