//! Account handlers: registration, login, profile updates.

use std::sync::Arc;

use parley_db::queries::users;
use parley_db::DbError;
use parley_proto::message::ServerMessage;
use parley_proto::payload::{LoginPayload, MyInfoPayload, RegisterPayload, UpdateUserPayload};
use tracing::{info, warn};

use crate::notify::reply;
use crate::registry::ConnId;
use crate::state::ServerState;

/// Create an account. Duplicate username/email replies with a typed
/// failure; the connection stays open so the client can retry.
pub async fn register(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: RegisterPayload,
) -> anyhow::Result<()> {
    let result = {
        let db = state.db.lock().await;
        users::register(&db, &p.email, &p.username, &p.password)
    };

    match result {
        Ok(_code) => {
            info!(username = %p.username, email = %p.email, "registered new user");
            reply(state, conn_id, ServerMessage::RegisterSuccess).await;
        }
        Err(DbError::Constraint(reason)) => {
            warn!(email = %p.email, %reason, "registration rejected");
            reply(state, conn_id, ServerMessage::RegisterFail).await;
        }
        Err(other) => {
            reply(state, conn_id, ServerMessage::RegisterFail).await;
            return Err(other.into());
        }
    }
    Ok(())
}

/// Authenticate and bind this connection to the user.
pub async fn login(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: LoginPayload,
) -> anyhow::Result<()> {
    let user = {
        let db = state.db.lock().await;
        users::check_credentials(&db, &p.email, &p.password)?
    };

    match user {
        Some(user) => {
            state
                .registry
                .lock()
                .await
                .bind(conn_id, user.uid, user.username.clone());

            info!(uid = user.uid, username = %user.username, "user logged in");
            reply(
                state,
                conn_id,
                ServerMessage::LoginSuccess(MyInfoPayload {
                    uid: user.uid,
                    username: user.username,
                    email: user.email,
                    friend_code: user.friend_code,
                }),
            )
            .await;
        }
        None => {
            warn!(conn_id, "login failed");
            reply(state, conn_id, ServerMessage::LoginFail).await;
        }
    }
    Ok(())
}

/// Apply a profile update; empty fields are left unchanged. The cached
/// username on the connection follows a username change.
pub async fn update_user(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: UpdateUserPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let result = {
        let db = state.db.lock().await;
        users::update(&db, uid, &p.new_username, &p.new_password)
    };

    match result {
        Ok(()) => {
            if !p.new_username.is_empty() {
                state
                    .registry
                    .lock()
                    .await
                    .set_username(conn_id, p.new_username.clone());
            }
        }
        // A taken username leaves the profile untouched; the reply shape
        // does not distinguish this, the client sees it on next login.
        Err(DbError::Constraint(reason)) => {
            warn!(uid, %reason, "profile update rejected");
        }
        Err(other) => return Err(other.into()),
    }

    reply(state, conn_id, ServerMessage::UpdateSuccess).await;
    Ok(())
}
