//! Fan-out refreshes.
//!
//! After any mutation of the conversation graph, affected online users
//! receive a fresh conversation list. The list is recomputed per
//! recipient because private-room names are recipient-relative.

use std::sync::Arc;

use parley_db::queries::conversations;
use parley_proto::message::ServerMessage;
use parley_proto::payload::ConversationSummary;
use parley_proto::types::{ConvType, Role};

use crate::registry::ConnId;
use crate::state::ServerState;

/// Translate storage rows into wire summaries.
pub fn to_summaries(rows: Vec<conversations::ConversationRow>) -> Vec<ConversationSummary> {
    rows.into_iter()
        .map(|row| ConversationSummary {
            conv_id: row.conv_id,
            conv_type: ConvType::from_u8(row.conv_type),
            name: row.name,
            description: row.description,
            unread_count: 0,
            my_role: Role::from_u8(row.my_role),
        })
        .collect()
}

/// Push a fresh conversation list to `uid` if they are online; silently
/// dropped otherwise.
pub async fn push_conversations(state: &Arc<ServerState>, uid: u32) -> anyhow::Result<()> {
    let rows = {
        let db = state.db.lock().await;
        conversations::list_for(&db, uid)?
    };
    let summaries = to_summaries(rows);

    if let Some(client) = state.registry.lock().await.online_by_uid(uid) {
        client.send(ServerMessage::Conversations(summaries));
    }
    Ok(())
}

/// Push fresh conversation lists to every current participant of
/// `conv_id`, minus an optional exclusion.
pub async fn notify_participants(
    state: &Arc<ServerState>,
    conv_id: u32,
    exclude_uid: Option<u32>,
) -> anyhow::Result<()> {
    let uids = {
        let db = state.db.lock().await;
        conversations::participants_of(&db, conv_id)?
    };

    for uid in uids {
        if Some(uid) == exclude_uid {
            continue;
        }
        push_conversations(state, uid).await?;
    }
    Ok(())
}

/// Reply on a specific connection, if it is still registered.
pub async fn reply(state: &Arc<ServerState>, conn_id: ConnId, msg: ServerMessage) {
    if let Some(client) = state.registry.lock().await.get(conn_id) {
        client.send(msg);
    }
}
