//! Message-type registry and protocol field limits.
//!
//! The numeric values are part of the wire protocol and must not change;
//! conforming clients depend on them bit-exactly.

// ---------------------------------------------------------------------------
// Message type constants
// ---------------------------------------------------------------------------

/// Register a new account (request: `RegisterPayload`).
pub const MSG_REGISTER: u32 = 1;
/// Registration accepted (response: empty).
pub const MSG_REGISTER_SUCCESS: u32 = 2;
/// Registration rejected (response: empty).
pub const MSG_REGISTER_FAIL: u32 = 3;
/// Authenticate (request: `LoginPayload`).
pub const MSG_LOGIN: u32 = 4;
/// Authentication accepted (response: `MyInfoPayload`).
pub const MSG_LOGIN_SUCCESS: u32 = 5;
/// Authentication rejected (response: empty).
pub const MSG_LOGIN_FAIL: u32 = 6;

/// Update username and/or password (request: `UpdateUserPayload`).
pub const MSG_UPDATE_USER: u32 = 7;
/// Profile update applied (response: empty).
pub const MSG_UPDATE_SUCCESS: u32 = 8;
/// Reserved; the server never emits it.
pub const MSG_UPDATE_FAIL: u32 = 9;

/// Fetch the contact list (request: empty).
pub const MSG_REQ_CONTACTS: u32 = 10;
/// Contact list (response/push: array of `ContactSummary`).
pub const MSG_RESP_CONTACTS: u32 = 11;
/// Send a friend request by friend code (request: `AddContactPayload`).
pub const MSG_ADD_BY_CODE: u32 = 12;
/// Friend request stored (response: empty).
pub const MSG_ADD_REQ_SENT: u32 = 13;
/// Reserved; the server never emits it.
pub const MSG_ADD_SUCCESS: u32 = 14;
/// Friend request rejected (unknown code, self, duplicate).
pub const MSG_ADD_FAIL: u32 = 15;
/// Fetch pending friend requests (request: empty).
pub const MSG_GET_REQUESTS: u32 = 16;
/// Pending friend requests (response/push: array of `ContactSummary`).
pub const MSG_RESP_REQUESTS: u32 = 17;
/// Accept or deny a pending request (request: `DecideRequestPayload`).
pub const MSG_DECIDE_REQUEST: u32 = 18;

/// Create a conversation (request: `CreateConvPayload`).
pub const MSG_CREATE_CONV: u32 = 19;
/// Conversation created or reused (response: u32 conv_id).
pub const MSG_CONV_CREATED: u32 = 20;
/// Fetch the conversation list (request: empty).
pub const MSG_REQ_CONVERSATIONS: u32 = 21;
/// Conversation list (response/push: array of `ConversationSummary`).
pub const MSG_RESP_CONVERSATIONS: u32 = 22;

/// Rename/describe a group, admin only (request: `UpdateGroupPayload`).
pub const MSG_UPDATE_GROUP: u32 = 23;
/// Add a member by friend code, admin only (request: `AddMemberPayload`).
pub const MSG_ADD_MEMBER: u32 = 24;
/// Member added (response: empty).
pub const MSG_MEMBER_ADDED: u32 = 25;
/// Fetch the member roster (request: `ReqMembersPayload`).
pub const MSG_REQ_MEMBERS: u32 = 26;
/// Member roster (response: array of `GroupMemberSummary`).
pub const MSG_RESP_MEMBERS: u32 = 27;
/// Remove a member, admin only (request: `KickMemberPayload`).
pub const MSG_KICK_MEMBER: u32 = 28;
/// Delete a group, admin only (request: `DeleteGroupPayload`).
pub const MSG_DELETE_GROUP: u32 = 29;

/// Send a text message (request: `SendMessagePayload`).
pub const MSG_SEND_TEXT: u32 = 30;
/// Live message routed to other participants (push: `RoutedMessagePayload`).
pub const MSG_RTE_TEXT: u32 = 31;
/// Fetch conversation history (request: `RequestHistoryPayload`).
pub const MSG_REQ_HISTORY: u32 = 32;
/// Rendered history text (response: raw UTF-8 bytes).
pub const MSG_RESP_HISTORY: u32 = 33;

/// Reserved; declared by the protocol but never sent.
pub const MSG_DISCONNECT: u32 = 34;

// ---------------------------------------------------------------------------
// Field capacities (bytes, including space for interior NUL padding)
// ---------------------------------------------------------------------------

/// Username capacity.
pub const MAX_NAME_LEN: usize = 32;
/// Email capacity.
pub const MAX_EMAIL_LEN: usize = 64;
/// Password capacity.
pub const MAX_PASS_LEN: usize = 64;
/// Message text capacity.
pub const MAX_TEXT_LEN: usize = 1024;
/// Group description capacity.
pub const MAX_DESC_LEN: usize = 64;
/// Friend code capacity (6 hex chars + NUL).
pub const FRIEND_CODE_LEN: usize = 7;
/// Maximum participant uids in a `CreateConvPayload`.
pub const MAX_PARTICIPANTS: usize = 10;

// ---------------------------------------------------------------------------
// Conversation types and participant roles
// ---------------------------------------------------------------------------

/// Conversation kind: a two-party private room or a named group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvType {
    /// Exactly two participants, unique per unordered pair.
    Private,
    /// A named group with an admin.
    Group,
}

impl ConvType {
    /// Wire encoding of the conversation type.
    pub fn as_u8(self) -> u8 {
        match self {
            ConvType::Private => 0,
            ConvType::Group => 1,
        }
    }

    /// Decode from the wire; anything nonzero is a group.
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            ConvType::Private
        } else {
            ConvType::Group
        }
    }
}

/// Participant role within a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Ordinary member.
    Member,
    /// Group administrator (the creator).
    Admin,
}

impl Role {
    /// Wire encoding of the role.
    pub fn as_u8(self) -> u8 {
        match self {
            Role::Member => 0,
            Role::Admin => 1,
        }
    }

    /// Decode from the wire; anything nonzero is admin.
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            Role::Member
        } else {
            Role::Admin
        }
    }
}
