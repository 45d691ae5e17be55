//! Chat handlers: message send with live fan-out, and history.
//!
//! Both verify that the caller participates in the target conversation;
//! a non-participant's packet changes nothing and gets no reply.

use std::sync::Arc;

use parley_db::queries::{conversations, messages};
use parley_proto::message::ServerMessage;
use parley_proto::payload::{RequestHistoryPayload, RoutedMessagePayload, SendMessagePayload};
use tracing::debug;

use crate::notify::reply;
use crate::registry::ConnId;
use crate::state::ServerState;

/// Persist a message and route it live to every other online
/// participant. The sender gets no echo.
pub async fn send_text(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: SendMessagePayload,
) -> anyhow::Result<()> {
    let (uid, username) = {
        let registry = state.registry.lock().await;
        match registry.get(conn_id) {
            Some(client) => (client.uid, client.username.clone()),
            None => return Ok(()),
        }
    };

    let participants = {
        let db = state.db.lock().await;
        if !conversations::is_participant(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "message from non-participant dropped");
            return Ok(());
        }
        messages::log(&db, &state.cipher, p.conv_id, uid, &p.text)?;
        conversations::participants_of(&db, p.conv_id)?
    };
    debug!(uid, conv_id = p.conv_id, "message logged");

    let registry = state.registry.lock().await;
    for target_uid in participants {
        if target_uid == uid {
            continue;
        }
        if let Some(target) = registry.online_by_uid(target_uid) {
            target.send(ServerMessage::RoutedText(RoutedMessagePayload {
                conv_id: p.conv_id,
                sender_uid: uid,
                sender_username: username.clone(),
                text: p.text.clone(),
            }));
        }
    }
    Ok(())
}

/// Reply with the rendered history window. Participants only; an empty
/// conversation yields an empty payload.
pub async fn req_history(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: RequestHistoryPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let rendered = {
        let db = state.db.lock().await;
        if !conversations::is_participant(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "history request from non-participant dropped");
            return Ok(());
        }
        messages::history(&db, &state.cipher, p.conv_id)?
    };

    reply(state, conn_id, ServerMessage::History(rendered)).await;
    Ok(())
}
