use bson::oid::ObjectId;
use orgdesk_db::models::{OrgRole, user::fallback};

/// The authenticated caller, scoped to the organization they are acting in.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub user_id: ObjectId,
    pub login: String,
    pub email: String,
    pub name: String,
    pub is_superuser: bool,
    pub org_id: ObjectId,
    pub org_name: String,
    pub org_role: OrgRole,
}

impl SignedInUser {
    /// How the caller is named to others, e.g. in invite emails.
    pub fn display_name(&self) -> &str {
        fallback(&[&self.name, &self.email, &self.login])
    }
}
