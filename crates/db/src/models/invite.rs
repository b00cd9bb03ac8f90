use std::fmt;

use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::OrgRole;

/// A pending claim to join an organization, redeemable once via its code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub code: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: OrgRole,
    pub invited_by_user_id: ObjectId,
    #[serde(default)]
    pub status: InviteStatus,
    #[serde(default)]
    pub email_sent: bool,
    pub email_sent_on: Option<DateTime>,
    pub remote_addr: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Invite {
    pub const COLLECTION: &'static str = "invites";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    #[default]
    Pending,
    Revoked,
    Completed,
}

impl InviteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Revoked => "revoked",
            InviteStatus::Completed => "completed",
        }
    }

    /// Only pending invites move, and only into a terminal state.
    pub fn can_transition_to(self, next: InviteStatus) -> bool {
        matches!(
            (self, next),
            (InviteStatus::Pending, InviteStatus::Completed)
                | (InviteStatus::Pending, InviteStatus::Revoked)
        )
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
