use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::OrgRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Org {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Org {
    pub const COLLECTION: &'static str = "orgs";
}

/// Membership of one user in one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub org_id: ObjectId,
    pub user_id: ObjectId,
    pub role: OrgRole,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl OrgUser {
    pub const COLLECTION: &'static str = "org_users";
}
