//! Persistence interfaces the HTTP layer talks to.
//!
//! Handlers branch on [`StoreError`] variants rather than on backend-specific
//! error codes, so any backend (MongoDB in production, in-memory in tests)
//! has to report missing rows as `NotFound` and uniqueness violations as
//! `AlreadyExists`.

use async_trait::async_trait;
use bson::oid::ObjectId;
use orgdesk_db::models::{Invite, InviteStatus, Org, OrgRole, OrgUser, User, user::fallback};
use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("BSON deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),
    #[error("Entity not found")]
    NotFound,
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const INVITE_CODE_LEN: usize = 30;

/// Random, unguessable invite code.
pub fn new_invite_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub login: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct AddOrgUser {
    pub org_id: ObjectId,
    pub user_id: ObjectId,
    pub role: OrgRole,
}

#[derive(Debug, Clone)]
pub struct CreateInvite {
    pub org_id: ObjectId,
    pub code: String,
    pub email: String,
    pub name: String,
    pub role: OrgRole,
    pub invited_by_user_id: ObjectId,
    pub remote_addr: Option<String>,
}

/// An invite joined with whoever sent it.
#[derive(Debug, Clone)]
pub struct InviteView {
    pub invite: Invite,
    pub invited_by_login: String,
    pub invited_by_email: String,
    pub invited_by_name: String,
}

impl InviteView {
    pub fn invited_by(&self) -> &str {
        fallback(&[
            &self.invited_by_name,
            &self.invited_by_login,
            &self.invited_by_email,
        ])
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: ObjectId) -> StoreResult<User>;

    /// Matches either the login or the email.
    async fn get_by_login(&self, login_or_email: &str) -> StoreResult<User>;

    /// Fails with `AlreadyExists` when the login or the email is taken.
    async fn create(&self, cmd: CreateUser) -> StoreResult<User>;

    async fn set_using_org(&self, user_id: ObjectId, org_id: ObjectId) -> StoreResult<()>;
}

#[async_trait]
pub trait OrgStore: Send + Sync {
    async fn get_by_id(&self, org_id: ObjectId) -> StoreResult<Org>;

    async fn get_org_user(&self, org_id: ObjectId, user_id: ObjectId) -> StoreResult<OrgUser>;

    /// Fails with `AlreadyExists` when the user is already a member.
    async fn add_org_user(&self, cmd: AddOrgUser) -> StoreResult<OrgUser>;
}

#[async_trait]
pub trait InviteStore: Send + Sync {
    async fn create(&self, cmd: CreateInvite) -> StoreResult<Invite>;

    async fn list_by_status(
        &self,
        org_id: ObjectId,
        status: InviteStatus,
    ) -> StoreResult<Vec<InviteView>>;

    async fn get_by_code(&self, code: &str) -> StoreResult<InviteView>;

    /// Moves a pending invite into `status`. Unknown codes and invites that
    /// already left `Pending` both report `NotFound`.
    async fn update_status(&self, code: &str, status: InviteStatus) -> StoreResult<()>;

    async fn mark_email_sent(&self, code: &str) -> StoreResult<()>;
}
