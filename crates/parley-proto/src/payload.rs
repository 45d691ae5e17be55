//! Fixed-layout payload records for every message type.
//!
//! Each record documents its wire size; `encode` always produces exactly
//! that many bytes and `decode` rejects anything else. List-shaped
//! responses (contacts, conversations, members) are concatenations of
//! fixed-size records with no count prefix; the receiver divides the
//! payload length by the record size.

use crate::codec::{FieldReader, FieldWriter};
use crate::types::{
    ConvType, Role, FRIEND_CODE_LEN, MAX_DESC_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PARTICIPANTS,
    MAX_PASS_LEN, MAX_TEXT_LEN,
};
use crate::{ProtoError, Result};

/// Account-creation request: email, username, password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterPayload {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl RegisterPayload {
    pub const SIZE: usize = MAX_EMAIL_LEN + MAX_NAME_LEN + MAX_PASS_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_str(&self.email, MAX_EMAIL_LEN);
        w.put_str(&self.username, MAX_NAME_LEN);
        w.put_str(&self.password, MAX_PASS_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("RegisterPayload", data, Self::SIZE)?;
        Ok(Self {
            email: r.get_str(MAX_EMAIL_LEN)?,
            username: r.get_str(MAX_NAME_LEN)?,
            password: r.get_str(MAX_PASS_LEN)?,
        })
    }
}

/// Authentication request: email and password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl LoginPayload {
    pub const SIZE: usize = MAX_EMAIL_LEN + MAX_PASS_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_str(&self.email, MAX_EMAIL_LEN);
        w.put_str(&self.password, MAX_PASS_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("LoginPayload", data, Self::SIZE)?;
        Ok(Self {
            email: r.get_str(MAX_EMAIL_LEN)?,
            password: r.get_str(MAX_PASS_LEN)?,
        })
    }
}

/// Account introspection returned on a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MyInfoPayload {
    pub uid: u32,
    pub username: String,
    pub email: String,
    /// 6 uppercase-hex characters; the 7th wire byte is the NUL pad.
    pub friend_code: String,
}

impl MyInfoPayload {
    pub const SIZE: usize = 4 + MAX_NAME_LEN + MAX_EMAIL_LEN + FRIEND_CODE_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.uid);
        w.put_str(&self.username, MAX_NAME_LEN);
        w.put_str(&self.email, MAX_EMAIL_LEN);
        w.put_str(&self.friend_code, FRIEND_CODE_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("MyInfoPayload", data, Self::SIZE)?;
        Ok(Self {
            uid: r.get_u32()?,
            username: r.get_str(MAX_NAME_LEN)?,
            email: r.get_str(MAX_EMAIL_LEN)?,
            friend_code: r.get_str(FRIEND_CODE_LEN)?,
        })
    }
}

/// Profile update; empty fields are left unchanged by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateUserPayload {
    pub new_username: String,
    pub new_password: String,
}

impl UpdateUserPayload {
    pub const SIZE: usize = MAX_NAME_LEN + MAX_PASS_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_str(&self.new_username, MAX_NAME_LEN);
        w.put_str(&self.new_password, MAX_PASS_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("UpdateUserPayload", data, Self::SIZE)?;
        Ok(Self {
            new_username: r.get_str(MAX_NAME_LEN)?,
            new_password: r.get_str(MAX_PASS_LEN)?,
        })
    }
}

/// Friend request addressed by friend code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddContactPayload {
    pub friend_code: String,
}

impl AddContactPayload {
    pub const SIZE: usize = FRIEND_CODE_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_str(&self.friend_code, FRIEND_CODE_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("AddContactPayload", data, Self::SIZE)?;
        Ok(Self {
            friend_code: r.get_str(FRIEND_CODE_LEN)?,
        })
    }
}

/// One row of a contact or pending-request list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactSummary {
    pub uid: u32,
    pub username: String,
    /// Reserved; the server emits 0.
    pub is_online: u32,
}

impl ContactSummary {
    pub const SIZE: usize = 4 + MAX_NAME_LEN + 4;

    pub fn encode_into(&self, w: &mut FieldWriter) {
        w.put_u32(self.uid);
        w.put_str(&self.username, MAX_NAME_LEN);
        w.put_u32(self.is_online);
    }

    pub fn encode_array(items: &[Self]) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(items.len() * Self::SIZE);
        for item in items {
            item.encode_into(&mut w);
        }
        w.finish()
    }

    pub fn decode_array(data: &[u8]) -> Result<Vec<Self>> {
        decode_records("ContactSummary", data, Self::SIZE, |r| {
            Ok(Self {
                uid: r.get_u32()?,
                username: r.get_str(MAX_NAME_LEN)?,
                is_online: r.get_u32()?,
            })
        })
    }
}

/// Accept (1) or deny (0) the pending request sent by `target_uid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecideRequestPayload {
    pub target_uid: u32,
    pub accepted: u8,
}

impl DecideRequestPayload {
    pub const SIZE: usize = 4 + 1;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.target_uid);
        w.put_u8(self.accepted);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("DecideRequestPayload", data, Self::SIZE)?;
        Ok(Self {
            target_uid: r.get_u32()?,
            accepted: r.get_u8()?,
        })
    }
}

/// Conversation-creation request.
///
/// The wire slot array always carries [`MAX_PARTICIPANTS`] uids; only the
/// first `participants_count` are meaningful. For groups, the first uid
/// is the caller and becomes the admin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateConvPayload {
    pub conv_type: ConvType,
    pub name: String,
    pub description: String,
    pub participant_uids: Vec<u32>,
}

impl CreateConvPayload {
    pub const SIZE: usize = 1 + MAX_NAME_LEN + MAX_DESC_LEN + 4 + MAX_PARTICIPANTS * 4;

    pub fn encode(&self) -> Vec<u8> {
        let count = self.participant_uids.len().min(MAX_PARTICIPANTS);
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u8(self.conv_type.as_u8());
        w.put_str(&self.name, MAX_NAME_LEN);
        w.put_str(&self.description, MAX_DESC_LEN);
        w.put_u32(count as u32);
        for slot in 0..MAX_PARTICIPANTS {
            w.put_u32(self.participant_uids.get(slot).copied().unwrap_or(0));
        }
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("CreateConvPayload", data, Self::SIZE)?;
        let conv_type = ConvType::from_u8(r.get_u8()?);
        let name = r.get_str(MAX_NAME_LEN)?;
        let description = r.get_str(MAX_DESC_LEN)?;
        let count = (r.get_u32()? as usize).min(MAX_PARTICIPANTS);
        let mut participant_uids = Vec::with_capacity(count);
        for slot in 0..MAX_PARTICIPANTS {
            let uid = r.get_u32()?;
            if slot < count {
                participant_uids.push(uid);
            }
        }
        Ok(Self {
            conv_type,
            name,
            description,
            participant_uids,
        })
    }
}

/// One row of a conversation list, named from the recipient's viewpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conv_id: u32,
    pub conv_type: ConvType,
    pub name: String,
    pub description: String,
    /// Client-maintained hint; the server always emits 0.
    pub unread_count: u32,
    pub my_role: Role,
}

impl ConversationSummary {
    pub const SIZE: usize = 4 + 1 + MAX_NAME_LEN + MAX_DESC_LEN + 4 + 1;

    pub fn encode_into(&self, w: &mut FieldWriter) {
        w.put_u32(self.conv_id);
        w.put_u8(self.conv_type.as_u8());
        w.put_str(&self.name, MAX_NAME_LEN);
        w.put_str(&self.description, MAX_DESC_LEN);
        w.put_u32(self.unread_count);
        w.put_u8(self.my_role.as_u8());
    }

    pub fn encode_array(items: &[Self]) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(items.len() * Self::SIZE);
        for item in items {
            item.encode_into(&mut w);
        }
        w.finish()
    }

    pub fn decode_array(data: &[u8]) -> Result<Vec<Self>> {
        decode_records("ConversationSummary", data, Self::SIZE, |r| {
            Ok(Self {
                conv_id: r.get_u32()?,
                conv_type: ConvType::from_u8(r.get_u8()?),
                name: r.get_str(MAX_NAME_LEN)?,
                description: r.get_str(MAX_DESC_LEN)?,
                unread_count: r.get_u32()?,
                my_role: Role::from_u8(r.get_u8()?),
            })
        })
    }
}

/// Outbound chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendMessagePayload {
    pub conv_id: u32,
    pub text: String,
}

impl SendMessagePayload {
    pub const SIZE: usize = 4 + MAX_TEXT_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.conv_id);
        w.put_str(&self.text, MAX_TEXT_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("SendMessagePayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
            text: r.get_str(MAX_TEXT_LEN)?,
        })
    }
}

/// Live message pushed to the other online participants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutedMessagePayload {
    pub conv_id: u32,
    pub sender_uid: u32,
    pub sender_username: String,
    pub text: String,
}

impl RoutedMessagePayload {
    pub const SIZE: usize = 4 + 4 + MAX_NAME_LEN + MAX_TEXT_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.conv_id);
        w.put_u32(self.sender_uid);
        w.put_str(&self.sender_username, MAX_NAME_LEN);
        w.put_str(&self.text, MAX_TEXT_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("RoutedMessagePayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
            sender_uid: r.get_u32()?,
            sender_username: r.get_str(MAX_NAME_LEN)?,
            text: r.get_str(MAX_TEXT_LEN)?,
        })
    }
}

/// History request for one conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestHistoryPayload {
    pub conv_id: u32,
}

impl RequestHistoryPayload {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        self.conv_id.to_be_bytes().to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("RequestHistoryPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
        })
    }
}

/// Group rename/re-describe request (admin only).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateGroupPayload {
    pub conv_id: u32,
    pub new_name: String,
    pub new_desc: String,
}

impl UpdateGroupPayload {
    pub const SIZE: usize = 4 + MAX_NAME_LEN + MAX_DESC_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.conv_id);
        w.put_str(&self.new_name, MAX_NAME_LEN);
        w.put_str(&self.new_desc, MAX_DESC_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("UpdateGroupPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
            new_name: r.get_str(MAX_NAME_LEN)?,
            new_desc: r.get_str(MAX_DESC_LEN)?,
        })
    }
}

/// Add a member to a group by friend code (admin only).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddMemberPayload {
    pub conv_id: u32,
    pub target_friend_code: String,
}

impl AddMemberPayload {
    pub const SIZE: usize = 4 + FRIEND_CODE_LEN;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.conv_id);
        w.put_str(&self.target_friend_code, FRIEND_CODE_LEN);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("AddMemberPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
            target_friend_code: r.get_str(FRIEND_CODE_LEN)?,
        })
    }
}

/// Member-roster request for one conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReqMembersPayload {
    pub conv_id: u32,
}

impl ReqMembersPayload {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        self.conv_id.to_be_bytes().to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("ReqMembersPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
        })
    }
}

/// One row of a group member roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMemberSummary {
    pub uid: u32,
    pub username: String,
    pub role: Role,
}

impl GroupMemberSummary {
    pub const SIZE: usize = 4 + MAX_NAME_LEN + 1;

    pub fn encode_into(&self, w: &mut FieldWriter) {
        w.put_u32(self.uid);
        w.put_str(&self.username, MAX_NAME_LEN);
        w.put_u8(self.role.as_u8());
    }

    pub fn encode_array(items: &[Self]) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(items.len() * Self::SIZE);
        for item in items {
            item.encode_into(&mut w);
        }
        w.finish()
    }

    pub fn decode_array(data: &[u8]) -> Result<Vec<Self>> {
        decode_records("GroupMemberSummary", data, Self::SIZE, |r| {
            Ok(Self {
                uid: r.get_u32()?,
                username: r.get_str(MAX_NAME_LEN)?,
                role: Role::from_u8(r.get_u8()?),
            })
        })
    }
}

/// Remove a member from a group (admin only, never self).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KickMemberPayload {
    pub conv_id: u32,
    pub target_uid: u32,
}

impl KickMemberPayload {
    pub const SIZE: usize = 4 + 4;

    pub fn encode(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(Self::SIZE);
        w.put_u32(self.conv_id);
        w.put_u32(self.target_uid);
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("KickMemberPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
            target_uid: r.get_u32()?,
        })
    }
}

/// Delete a group and its history (admin only).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteGroupPayload {
    pub conv_id: u32,
}

impl DeleteGroupPayload {
    pub const SIZE: usize = 4;

    pub fn encode(&self) -> Vec<u8> {
        self.conv_id.to_be_bytes().to_vec()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = FieldReader::new("DeleteGroupPayload", data, Self::SIZE)?;
        Ok(Self {
            conv_id: r.get_u32()?,
        })
    }
}

/// Decode a concatenation of fixed-size records.
fn decode_records<T>(
    kind: &'static str,
    data: &[u8],
    record_size: usize,
    mut decode_one: impl FnMut(&mut FieldReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    if data.len() % record_size != 0 {
        return Err(ProtoError::BadLength {
            kind,
            expected: record_size,
            actual: data.len() % record_size,
        });
    }
    data.chunks_exact(record_size)
        .map(|chunk| decode_one(&mut FieldReader::over_slice(kind, chunk)))
        .collect()
}
