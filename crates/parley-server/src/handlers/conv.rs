//! Conversation and group handlers.
//!
//! Admin-only operations verify the caller's role and silently drop on
//! failure: no state change, no error packet. The authorization result
//! is deliberately indistinguishable from the packet being lost.

use std::sync::Arc;

use parley_db::queries::{conversations, users};
use parley_proto::message::ServerMessage;
use parley_proto::payload::{
    AddMemberPayload, CreateConvPayload, DeleteGroupPayload, GroupMemberSummary,
    KickMemberPayload, ReqMembersPayload, UpdateGroupPayload,
};
use parley_proto::types::{ConvType, Role};
use tracing::{debug, info};

use crate::notify::{notify_participants, push_conversations, reply, to_summaries};
use crate::registry::ConnId;
use crate::state::ServerState;

/// Create a conversation, or reuse the existing private room for a
/// pair. The caller always receives `CONV_CREATED` with the resulting
/// id; the other participants get conversation refreshes only when a
/// room was actually created.
pub async fn create_conv(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: CreateConvPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    let uids = p.participant_uids.clone();

    let (conv_id, created) = {
        let mut db = state.db.lock().await;

        let existing = if p.conv_type == ConvType::Private && uids.len() == 2 {
            conversations::find_private(&db, uids[0], uids[1])?
        } else {
            None
        };

        match existing {
            Some(id) => (id, false),
            None => {
                let id = conversations::create(
                    &mut db,
                    p.conv_type.as_u8(),
                    &p.name,
                    &p.description,
                    &uids,
                )?;
                (id, true)
            }
        }
    };

    reply(state, conn_id, ServerMessage::ConvCreated(conv_id)).await;

    if created {
        info!(uid, conv_id, kind = ?p.conv_type, "conversation created");
        for other in uids.iter().filter(|&&u| u != uid) {
            push_conversations(state, *other).await?;
        }
    }
    Ok(())
}

/// Reply with the caller's conversation list.
pub async fn req_conversations(state: &Arc<ServerState>, conn_id: ConnId) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    let rows = {
        let db = state.db.lock().await;
        conversations::list_for(&db, uid)?
    };
    reply(state, conn_id, ServerMessage::Conversations(to_summaries(rows))).await;
    Ok(())
}

/// Rename/re-describe a group. Admin only.
pub async fn update_group(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: UpdateGroupPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    {
        let db = state.db.lock().await;
        if !conversations::is_admin(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "non-admin group update dropped");
            return Ok(());
        }
        conversations::update_group(&db, p.conv_id, &p.new_name, &p.new_desc)?;
    }

    notify_participants(state, p.conv_id, None).await
}

/// Add a member by friend code. Admin only; idempotent on repeats.
pub async fn add_member(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: AddMemberPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let resolved = {
        let db = state.db.lock().await;
        if !conversations::is_admin(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "non-admin add-member dropped");
            return Ok(());
        }
        match users::get_uid_by_code(&db, &p.target_friend_code)? {
            Some(target_uid) => {
                // Insert-or-ignore: re-adding an existing member is an
                // idempotent success.
                conversations::add_participant(
                    &db,
                    p.conv_id,
                    target_uid,
                    conversations::ROLE_MEMBER,
                )?;
                true
            }
            None => false,
        }
    };

    if resolved {
        reply(state, conn_id, ServerMessage::MemberAdded).await;
        notify_participants(state, p.conv_id, None).await?;
    }
    Ok(())
}

/// Reply with the member roster. Participants only.
pub async fn req_members(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: ReqMembersPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let members = {
        let db = state.db.lock().await;
        if !conversations::is_participant(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "roster request from non-participant dropped");
            return Ok(());
        }
        conversations::members_of(&db, p.conv_id)?
    };

    let summaries: Vec<GroupMemberSummary> = members
        .into_iter()
        .map(|m| GroupMemberSummary {
            uid: m.uid,
            username: m.username,
            role: Role::from_u8(m.role),
        })
        .collect();

    reply(state, conn_id, ServerMessage::Members(summaries)).await;
    Ok(())
}

/// Remove a member. Admin only; self-kick is dropped.
pub async fn kick_member(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: KickMemberPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;
    if p.target_uid == uid {
        debug!(uid, conv_id = p.conv_id, "self-kick dropped");
        return Ok(());
    }

    {
        let db = state.db.lock().await;
        if !conversations::is_admin(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "non-admin kick dropped");
            return Ok(());
        }
        conversations::remove_participant(&db, p.conv_id, p.target_uid)?;
    }
    info!(uid, conv_id = p.conv_id, target = p.target_uid, "member kicked");

    // Remaining members see the roster change; the kicked user gets a
    // refresh of their own so the conversation vanishes from their view.
    notify_participants(state, p.conv_id, None).await?;
    push_conversations(state, p.target_uid).await?;
    Ok(())
}

/// Delete a group and its history. Admin only. The participant list is
/// captured before the cascade so every former member still gets a
/// refresh.
pub async fn delete_group(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    p: DeleteGroupPayload,
) -> anyhow::Result<()> {
    let uid = super::uid_of(state, conn_id).await;

    let former = {
        let mut db = state.db.lock().await;
        if !conversations::is_admin(&db, p.conv_id, uid)? {
            debug!(uid, conv_id = p.conv_id, "non-admin delete dropped");
            return Ok(());
        }
        let members = conversations::participants_of(&db, p.conv_id)?;
        conversations::delete(&mut db, p.conv_id)?;
        members
    };
    info!(uid, conv_id = p.conv_id, "group deleted");

    for member in former {
        push_conversations(state, member).await?;
    }
    Ok(())
}
