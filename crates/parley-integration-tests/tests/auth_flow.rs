//! Integration test: account lifecycle over a real TLS connection.
//!
//! 1. Register an account, disconnect
//! 2. Reconnect and log in, introspect the returned account info
//! 3. Reject wrong credentials and duplicate registrations
//! 4. Drop pre-authentication traffic silently

use parley_integration_tests::{login_fresh_user, TestClient, TestServer};
use parley_proto::message::{ClientMessage, ServerMessage};
use parley_proto::payload::{RegisterPayload, UpdateUserPayload};

#[tokio::test]
async fn register_then_login_introspects_account() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut client = TestClient::connect(server.addr).await?;
    let response = client.register("a@x", "alice", "pw1").await?;
    assert_eq!(response, ServerMessage::RegisterSuccess);
    drop(client);

    let mut client = TestClient::connect(server.addr).await?;
    let info = client.login("a@x", "pw1").await?;
    assert_eq!(info.uid, 1);
    assert_eq!(info.username, "alice");
    assert_eq!(info.email, "a@x");
    assert_eq!(info.friend_code.len(), 6);
    assert!(info.friend_code.chars().all(|c| c.is_ascii_hexdigit()));
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_rejected() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut client = TestClient::connect(server.addr).await?;
    client.register("a@x", "alice", "pw1").await?;

    let mut client = TestClient::connect(server.addr).await?;
    client
        .send(&ClientMessage::Login(parley_proto::payload::LoginPayload {
            email: "a@x".into(),
            password: "wrong".into(),
        }))
        .await?;
    assert_eq!(client.recv().await?, ServerMessage::LoginFail);

    // The connection survives a failed login and accepts a retry.
    let info = client.login("a@x", "pw1").await?;
    assert_eq!(info.username, "alice");
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_rejected() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut client = TestClient::connect(server.addr).await?;
    assert_eq!(
        client.register("a@x", "alice", "pw1").await?,
        ServerMessage::RegisterSuccess
    );
    assert_eq!(
        client.register("a@x", "other", "pw2").await?,
        ServerMessage::RegisterFail
    );
    assert_eq!(
        client.register("b@x", "alice", "pw2").await?,
        ServerMessage::RegisterFail
    );
    Ok(())
}

#[tokio::test]
async fn pre_auth_traffic_dropped() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut client = TestClient::connect(server.addr).await?;
    client.send(&ClientMessage::ReqContacts).await?;
    client.send(&ClientMessage::ReqConversations).await?;
    client.expect_silence().await?;

    // Register still works on the same connection afterwards.
    client
        .send(&ClientMessage::Register(RegisterPayload {
            email: "a@x".into(),
            username: "alice".into(),
            password: "pw1".into(),
        }))
        .await?;
    assert_eq!(client.recv().await?, ServerMessage::RegisterSuccess);
    Ok(())
}

#[tokio::test]
async fn update_user_changes_username() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let (mut alice, _info) = login_fresh_user(server.addr, "a@x", "alice").await?;

    alice
        .send(&ClientMessage::UpdateUser(UpdateUserPayload {
            new_username: "alicia".into(),
            new_password: String::new(),
        }))
        .await?;
    assert_eq!(alice.recv().await?, ServerMessage::UpdateSuccess);
    drop(alice);

    // Old password still valid, new username visible at login.
    let mut client = TestClient::connect(server.addr).await?;
    let info = client.login("a@x", "pw1").await?;
    assert_eq!(info.username, "alicia");
    Ok(())
}
