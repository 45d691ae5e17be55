//! Typed message envelopes.
//!
//! [`ClientMessage`] is every request the server accepts and
//! [`ServerMessage`] every response or push it emits. Both decode from
//! and encode to a `(type, payload-bytes)` pair, so the dispatcher and
//! the test client share one vocabulary and no raw buffer ever crosses a
//! handler boundary.

use crate::payload::{
    AddContactPayload, AddMemberPayload, ContactSummary, ConversationSummary, CreateConvPayload,
    DecideRequestPayload, DeleteGroupPayload, GroupMemberSummary, KickMemberPayload, LoginPayload,
    MyInfoPayload, RegisterPayload, ReqMembersPayload, RequestHistoryPayload, RoutedMessagePayload,
    SendMessagePayload, UpdateGroupPayload, UpdateUserPayload,
};
use crate::types::*;
use crate::{ProtoError, Result};

/// A request from a client, decoded and owned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    Register(RegisterPayload),
    Login(LoginPayload),
    UpdateUser(UpdateUserPayload),
    ReqContacts,
    AddByCode(AddContactPayload),
    GetRequests,
    DecideRequest(DecideRequestPayload),
    CreateConv(CreateConvPayload),
    ReqConversations,
    UpdateGroup(UpdateGroupPayload),
    AddMember(AddMemberPayload),
    ReqMembers(ReqMembersPayload),
    KickMember(KickMemberPayload),
    DeleteGroup(DeleteGroupPayload),
    SendText(SendMessagePayload),
    ReqHistory(RequestHistoryPayload),
}

impl ClientMessage {
    /// Decode a framed request.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnknownType`] for a type outside the request
    /// catalog (including server-to-client types) and
    /// [`ProtoError::BadLength`] for a payload that does not match its
    /// fixed layout.
    pub fn decode(msg_type: u32, payload: &[u8]) -> Result<Self> {
        match msg_type {
            MSG_REGISTER => Ok(Self::Register(RegisterPayload::decode(payload)?)),
            MSG_LOGIN => Ok(Self::Login(LoginPayload::decode(payload)?)),
            MSG_UPDATE_USER => Ok(Self::UpdateUser(UpdateUserPayload::decode(payload)?)),
            MSG_REQ_CONTACTS => Ok(Self::ReqContacts),
            MSG_ADD_BY_CODE => Ok(Self::AddByCode(AddContactPayload::decode(payload)?)),
            MSG_GET_REQUESTS => Ok(Self::GetRequests),
            MSG_DECIDE_REQUEST => Ok(Self::DecideRequest(DecideRequestPayload::decode(payload)?)),
            MSG_CREATE_CONV => Ok(Self::CreateConv(CreateConvPayload::decode(payload)?)),
            MSG_REQ_CONVERSATIONS => Ok(Self::ReqConversations),
            MSG_UPDATE_GROUP => Ok(Self::UpdateGroup(UpdateGroupPayload::decode(payload)?)),
            MSG_ADD_MEMBER => Ok(Self::AddMember(AddMemberPayload::decode(payload)?)),
            MSG_REQ_MEMBERS => Ok(Self::ReqMembers(ReqMembersPayload::decode(payload)?)),
            MSG_KICK_MEMBER => Ok(Self::KickMember(KickMemberPayload::decode(payload)?)),
            MSG_DELETE_GROUP => Ok(Self::DeleteGroup(DeleteGroupPayload::decode(payload)?)),
            MSG_SEND_TEXT => Ok(Self::SendText(SendMessagePayload::decode(payload)?)),
            MSG_REQ_HISTORY => Ok(Self::ReqHistory(RequestHistoryPayload::decode(payload)?)),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    /// Encode to a `(type, payload)` pair for transmission.
    pub fn encode(&self) -> (u32, Vec<u8>) {
        match self {
            Self::Register(p) => (MSG_REGISTER, p.encode()),
            Self::Login(p) => (MSG_LOGIN, p.encode()),
            Self::UpdateUser(p) => (MSG_UPDATE_USER, p.encode()),
            Self::ReqContacts => (MSG_REQ_CONTACTS, Vec::new()),
            Self::AddByCode(p) => (MSG_ADD_BY_CODE, p.encode()),
            Self::GetRequests => (MSG_GET_REQUESTS, Vec::new()),
            Self::DecideRequest(p) => (MSG_DECIDE_REQUEST, p.encode()),
            Self::CreateConv(p) => (MSG_CREATE_CONV, p.encode()),
            Self::ReqConversations => (MSG_REQ_CONVERSATIONS, Vec::new()),
            Self::UpdateGroup(p) => (MSG_UPDATE_GROUP, p.encode()),
            Self::AddMember(p) => (MSG_ADD_MEMBER, p.encode()),
            Self::ReqMembers(p) => (MSG_REQ_MEMBERS, p.encode()),
            Self::KickMember(p) => (MSG_KICK_MEMBER, p.encode()),
            Self::DeleteGroup(p) => (MSG_DELETE_GROUP, p.encode()),
            Self::SendText(p) => (MSG_SEND_TEXT, p.encode()),
            Self::ReqHistory(p) => (MSG_REQ_HISTORY, p.encode()),
        }
    }

    /// Whether this request is honored before a successful login.
    /// Everything else is silently dropped on an unauthenticated
    /// connection.
    pub fn allowed_before_auth(&self) -> bool {
        matches!(self, Self::Register(_) | Self::Login(_))
    }
}

/// A response or asynchronous push emitted by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    RegisterSuccess,
    RegisterFail,
    LoginSuccess(MyInfoPayload),
    LoginFail,
    UpdateSuccess,
    Contacts(Vec<ContactSummary>),
    AddReqSent,
    AddFail,
    Requests(Vec<ContactSummary>),
    ConvCreated(u32),
    Conversations(Vec<ConversationSummary>),
    MemberAdded,
    Members(Vec<GroupMemberSummary>),
    RoutedText(RoutedMessagePayload),
    /// Rendered history text; may be empty.
    History(String),
}

impl ServerMessage {
    /// Encode to a `(type, payload)` pair for transmission.
    pub fn encode(&self) -> (u32, Vec<u8>) {
        match self {
            Self::RegisterSuccess => (MSG_REGISTER_SUCCESS, Vec::new()),
            Self::RegisterFail => (MSG_REGISTER_FAIL, Vec::new()),
            Self::LoginSuccess(p) => (MSG_LOGIN_SUCCESS, p.encode()),
            Self::LoginFail => (MSG_LOGIN_FAIL, Vec::new()),
            Self::UpdateSuccess => (MSG_UPDATE_SUCCESS, Vec::new()),
            Self::Contacts(items) => (MSG_RESP_CONTACTS, ContactSummary::encode_array(items)),
            Self::AddReqSent => (MSG_ADD_REQ_SENT, Vec::new()),
            Self::AddFail => (MSG_ADD_FAIL, Vec::new()),
            Self::Requests(items) => (MSG_RESP_REQUESTS, ContactSummary::encode_array(items)),
            Self::ConvCreated(conv_id) => (MSG_CONV_CREATED, conv_id.to_be_bytes().to_vec()),
            Self::Conversations(items) => (
                MSG_RESP_CONVERSATIONS,
                ConversationSummary::encode_array(items),
            ),
            Self::MemberAdded => (MSG_MEMBER_ADDED, Vec::new()),
            Self::Members(items) => (MSG_RESP_MEMBERS, GroupMemberSummary::encode_array(items)),
            Self::RoutedText(p) => (MSG_RTE_TEXT, p.encode()),
            Self::History(text) => (MSG_RESP_HISTORY, text.clone().into_bytes()),
        }
    }

    /// Decode a framed server packet (used by clients).
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnknownType`] for a type outside the
    /// response catalog and [`ProtoError::BadLength`] on layout mismatch.
    pub fn decode(msg_type: u32, payload: &[u8]) -> Result<Self> {
        match msg_type {
            MSG_REGISTER_SUCCESS => Ok(Self::RegisterSuccess),
            MSG_REGISTER_FAIL => Ok(Self::RegisterFail),
            MSG_LOGIN_SUCCESS => Ok(Self::LoginSuccess(MyInfoPayload::decode(payload)?)),
            MSG_LOGIN_FAIL => Ok(Self::LoginFail),
            MSG_UPDATE_SUCCESS => Ok(Self::UpdateSuccess),
            MSG_RESP_CONTACTS => Ok(Self::Contacts(ContactSummary::decode_array(payload)?)),
            MSG_ADD_REQ_SENT => Ok(Self::AddReqSent),
            MSG_ADD_FAIL => Ok(Self::AddFail),
            MSG_RESP_REQUESTS => Ok(Self::Requests(ContactSummary::decode_array(payload)?)),
            MSG_CONV_CREATED => {
                if payload.len() != 4 {
                    return Err(ProtoError::BadLength {
                        kind: "ConvCreated",
                        expected: 4,
                        actual: payload.len(),
                    });
                }
                let mut arr = [0u8; 4];
                arr.copy_from_slice(payload);
                Ok(Self::ConvCreated(u32::from_be_bytes(arr)))
            }
            MSG_RESP_CONVERSATIONS => Ok(Self::Conversations(ConversationSummary::decode_array(
                payload,
            )?)),
            MSG_MEMBER_ADDED => Ok(Self::MemberAdded),
            MSG_RESP_MEMBERS => Ok(Self::Members(GroupMemberSummary::decode_array(payload)?)),
            MSG_RTE_TEXT => Ok(Self::RoutedText(RoutedMessagePayload::decode(payload)?)),
            MSG_RESP_HISTORY => Ok(Self::History(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            other => Err(ProtoError::UnknownType(other)),
        }
    }
}
