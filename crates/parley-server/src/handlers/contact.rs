//! Contact handlers: contact lists, friend requests, and the
//! accept/deny decision that materializes private rooms.

use std::sync::Arc;

use parley_db::queries::{contacts, conversations, requests, users};
use parley_proto::message::ServerMessage;
use parley_proto::payload::{AddContactPayload, ContactSummary, DecideRequestPayload};
use tracing::info;

use crate::notify::{push_conversations, reply};
use crate::registry::ConnId;
use crate::state::ServerState;

fn to_summaries(rows: Vec<contacts::ContactRow>) -> Vec<ContactSummary> {
    rows.into_iter()
        .map(|row| ContactSummary {
            uid: row.uid,
            username: row.username,
            is_online: 0,
        })
        .collect()
}

/// Reply with the caller's contact list.
pub async fn req_contacts(state: &Arc<ServerState>, conn_id: ConnId) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    let rows = {
        let db = state.db.lock().await;
        contacts::list_for(&db, uid)?
    };
    reply(state, conn_id, ServerMessage::Contacts(to_summaries(rows))).await;
    Ok(())
}

/// Reply with the pending requests addressed to the caller.
pub async fn get_requests(state: &Arc<ServerState>, conn_id: ConnId) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    let rows = {
        let db = state.db.lock().await;
        requests::list_for(&db, uid)?
    };
    reply(state, conn_id, ServerMessage::Requests(to_summaries(rows))).await;
    Ok(())
}

/// File a friend request against a friend code. On success the target,
/// if online, sees their pending list refresh immediately.
pub async fn add_by_code(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: AddContactPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let outcome = {
        let db = state.db.lock().await;
        match users::get_uid_by_code(&db, &p.friend_code)? {
            Some(target_uid) => {
                if requests::add(&db, uid, target_uid)? {
                    Some((target_uid, requests::list_for(&db, target_uid)?))
                } else {
                    None
                }
            }
            None => None,
        }
    };

    match outcome {
        Some((target_uid, target_pending)) => {
            reply(state, conn_id, ServerMessage::AddReqSent).await;

            if let Some(target) = state.registry.lock().await.online_by_uid(target_uid) {
                target.send(ServerMessage::Requests(to_summaries(target_pending)));
            }
        }
        None => {
            reply(state, conn_id, ServerMessage::AddFail).await;
        }
    }
    Ok(())
}

/// Accept or deny a pending request.
///
/// Accepting records the friendship, materializes the private room if
/// the pair has none, and refreshes both parties' contact and
/// conversation views. Either way the request row is consumed and the
/// caller gets fresh contact and request lists.
pub async fn decide_request(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: DecideRequestPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    let accepted = p.accepted != 0;

    if accepted {
        {
            let mut db = state.db.lock().await;
            contacts::add_friendship(&db, uid, p.target_uid)?;

            if conversations::find_private(&db, uid, p.target_uid)?.is_none() {
                let conv_id = conversations::create(
                    &mut db,
                    conversations::TYPE_PRIVATE,
                    "Private Chat",
                    "",
                    &[uid, p.target_uid],
                )?;
                info!(uid, target = p.target_uid, conv_id, "private room created");
            }
        }

        push_conversations(state, uid).await?;
        push_conversations(state, p.target_uid).await?;
    }

    // The request was stored as (sender = target, receiver = self).
    let (my_contacts, my_pending, sender_contacts) = {
        let db = state.db.lock().await;
        requests::remove(&db, p.target_uid, uid)?;
        (
            contacts::list_for(&db, uid)?,
            requests::list_for(&db, uid)?,
            contacts::list_for(&db, p.target_uid)?,
        )
    };

    reply(state, conn_id, ServerMessage::Contacts(to_summaries(my_contacts))).await;
    reply(state, conn_id, ServerMessage::Requests(to_summaries(my_pending))).await;

    if accepted {
        if let Some(sender) = state.registry.lock().await.online_by_uid(p.target_uid) {
            sender.send(ServerMessage::Contacts(to_summaries(sender_contacts)));
        }
    }
    Ok(())
}
