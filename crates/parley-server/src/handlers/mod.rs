//! Domain handlers, one module per area.

pub mod auth;
pub mod chat;
pub mod contact;
pub mod conv;

use std::sync::Arc;

use parley_proto::message::ClientMessage;

use crate::registry::ConnId;
use crate::state::ServerState;

/// Route a decoded request to its handler.
///
/// The dispatcher has already applied the pre-auth gate; everything
/// arriving here is either REGISTER/LOGIN or comes from an
/// authenticated connection.
pub async fn dispatch(
    state: &Arc<ServerState>,
    conn_id: ConnId,
    msg: ClientMessage,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::Register(p) => auth::register(state, conn_id, p).await,
        ClientMessage::Login(p) => auth::login(state, conn_id, p).await,
        ClientMessage::UpdateUser(p) => auth::update_user(state, conn_id, p).await,

        ClientMessage::ReqContacts => contact::req_contacts(state, conn_id).await,
        ClientMessage::AddByCode(p) => contact::add_by_code(state, conn_id, p).await,
        ClientMessage::GetRequests => contact::get_requests(state, conn_id).await,
        ClientMessage::DecideRequest(p) => contact::decide_request(state, conn_id, p).await,

        ClientMessage::CreateConv(p) => conv::create_conv(state, conn_id, p).await,
        ClientMessage::ReqConversations => conv::req_conversations(state, conn_id).await,
        ClientMessage::UpdateGroup(p) => conv::update_group(state, conn_id, p).await,
        ClientMessage::AddMember(p) => conv::add_member(state, conn_id, p).await,
        ClientMessage::ReqMembers(p) => conv::req_members(state, conn_id, p).await,
        ClientMessage::KickMember(p) => conv::kick_member(state, conn_id, p).await,
        ClientMessage::DeleteGroup(p) => conv::delete_group(state, conn_id, p).await,

        ClientMessage::SendText(p) => chat::send_text(state, conn_id, p).await,
        ClientMessage::ReqHistory(p) => chat::req_history(state, conn_id, p).await,
    }
}

/// The authenticated uid behind a connection, 0 if none.
pub(crate) async fn uid_of(state: &Arc<ServerState>, conn_id: ConnId) -> u32 {
    state.registry.lock().await.uid_of(conn_id)
}
