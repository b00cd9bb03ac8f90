//! In-memory collaborators so the router can be exercised without MongoDB,
//! a mail relay or a search backend.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{DateTime, oid::ObjectId};
use dashmap::DashMap;
use orgdesk_db::models::{Invite, InviteStatus, Org, OrgUser, User};
use orgdesk_services::{
    EventBus, InviteStore, Mailer, MetricsSink, OrgStore, SearchService, SignedInUser, StoreError,
    StoreResult, UserStore,
    events::{Event, EventError},
    metrics::{SEARCH_NOT_SERVED, SIGNUP_COMPLETED, SIGNUP_INVITE},
    notifications::{NotificationError, SendEmail},
    search::{DashboardQuery, Frame, ReadinessCheck, SearchError},
    store::{AddOrgUser, CreateInvite, CreateUser, InviteView},
};
use parking_lot::Mutex;

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<User>>,
}

impl MemoryUsers {
    pub fn find(&self, id: ObjectId) -> Option<User> {
        self.users.lock().iter().find(|u| u.id == Some(id)).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().len()
    }

    pub fn make_superuser(&self, id: ObjectId) {
        if let Some(user) = self.users.lock().iter_mut().find(|u| u.id == Some(id)) {
            user.is_superuser = true;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn get_by_id(&self, id: ObjectId) -> StoreResult<User> {
        self.find(id).ok_or(StoreError::NotFound)
    }

    async fn get_by_login(&self, login_or_email: &str) -> StoreResult<User> {
        self.users
            .lock()
            .iter()
            .find(|u| u.login == login_or_email || u.email == login_or_email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, cmd: CreateUser) -> StoreResult<User> {
        let mut users = self.users.lock();
        if users
            .iter()
            .any(|u| u.login == cmd.login || u.email == cmd.email)
        {
            return Err(StoreError::AlreadyExists(cmd.login));
        }
        let now = DateTime::now();
        let user = User {
            id: Some(ObjectId::new()),
            email: cmd.email,
            login: cmd.login,
            name: cmd.name,
            password_hash: Some(cmd.password_hash),
            is_superuser: false,
            org_id: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_using_org(&self, user_id: ObjectId, org_id: ObjectId) -> StoreResult<()> {
        let mut users = self.users.lock();
        let user = users
            .iter_mut()
            .find(|u| u.id == Some(user_id))
            .ok_or(StoreError::NotFound)?;
        user.org_id = Some(org_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrgs {
    orgs: Mutex<Vec<Org>>,
    members: Mutex<Vec<OrgUser>>,
    /// When set, `add_org_user` records nothing and reports a duplicate membership.
    reject_as_existing: AtomicBool,
}

impl MemoryOrgs {
    pub fn insert(&self, name: &str) -> Org {
        let now = DateTime::now();
        let org = Org {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.orgs.lock().push(org.clone());
        org
    }

    pub fn reject_memberships_as_existing(&self, reject: bool) {
        self.reject_as_existing.store(reject, Ordering::SeqCst);
    }

    pub fn membership(&self, org_id: ObjectId, user_id: ObjectId) -> Option<OrgUser> {
        self.members
            .lock()
            .iter()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl OrgStore for MemoryOrgs {
    async fn get_by_id(&self, org_id: ObjectId) -> StoreResult<Org> {
        self.orgs
            .lock()
            .iter()
            .find(|o| o.id == Some(org_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_org_user(&self, org_id: ObjectId, user_id: ObjectId) -> StoreResult<OrgUser> {
        self.membership(org_id, user_id).ok_or(StoreError::NotFound)
    }

    async fn add_org_user(&self, cmd: AddOrgUser) -> StoreResult<OrgUser> {
        if self.reject_as_existing.load(Ordering::SeqCst) {
            return Err(StoreError::AlreadyExists(cmd.user_id.to_hex()));
        }
        let mut members = self.members.lock();
        if members
            .iter()
            .any(|m| m.org_id == cmd.org_id && m.user_id == cmd.user_id)
        {
            return Err(StoreError::AlreadyExists(cmd.user_id.to_hex()));
        }
        let now = DateTime::now();
        let member = OrgUser {
            id: Some(ObjectId::new()),
            org_id: cmd.org_id,
            user_id: cmd.user_id,
            role: cmd.role,
            created_at: now,
            updated_at: now,
        };
        members.push(member.clone());
        Ok(member)
    }
}

pub struct MemoryInvites {
    invites: Mutex<Vec<Invite>>,
    users: std::sync::Arc<MemoryUsers>,
}

impl MemoryInvites {
    pub fn new(users: std::sync::Arc<MemoryUsers>) -> Self {
        Self {
            invites: Mutex::new(Vec::new()),
            users,
        }
    }

    pub fn all(&self) -> Vec<Invite> {
        self.invites.lock().clone()
    }

    pub fn find(&self, code: &str) -> Option<Invite> {
        self.invites.lock().iter().find(|i| i.code == code).cloned()
    }

    fn view(&self, invite: Invite) -> InviteView {
        let inviter = self.users.find(invite.invited_by_user_id);
        InviteView {
            invited_by_login: inviter.as_ref().map(|u| u.login.clone()).unwrap_or_default(),
            invited_by_email: inviter.as_ref().map(|u| u.email.clone()).unwrap_or_default(),
            invited_by_name: inviter.map(|u| u.name).unwrap_or_default(),
            invite,
        }
    }
}

#[async_trait]
impl InviteStore for MemoryInvites {
    async fn create(&self, cmd: CreateInvite) -> StoreResult<Invite> {
        let mut invites = self.invites.lock();
        if invites.iter().any(|i| i.code == cmd.code) {
            return Err(StoreError::AlreadyExists(cmd.code));
        }
        let now = DateTime::now();
        let invite = Invite {
            id: Some(ObjectId::new()),
            org_id: cmd.org_id,
            code: cmd.code,
            email: cmd.email,
            name: cmd.name,
            role: cmd.role,
            invited_by_user_id: cmd.invited_by_user_id,
            status: InviteStatus::Pending,
            email_sent: false,
            email_sent_on: None,
            remote_addr: cmd.remote_addr,
            created_at: now,
            updated_at: now,
        };
        invites.push(invite.clone());
        Ok(invite)
    }

    async fn list_by_status(
        &self,
        org_id: ObjectId,
        status: InviteStatus,
    ) -> StoreResult<Vec<InviteView>> {
        let matching: Vec<Invite> = self
            .invites
            .lock()
            .iter()
            .filter(|i| i.org_id == org_id && i.status == status)
            .cloned()
            .collect();
        Ok(matching.into_iter().map(|i| self.view(i)).collect())
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<InviteView> {
        let invite = self.find(code).ok_or(StoreError::NotFound)?;
        Ok(self.view(invite))
    }

    async fn update_status(&self, code: &str, status: InviteStatus) -> StoreResult<()> {
        let mut invites = self.invites.lock();
        let invite = invites
            .iter_mut()
            .find(|i| i.code == code && i.status == InviteStatus::Pending)
            .ok_or(StoreError::NotFound)?;
        if !invite.status.can_transition_to(status) {
            return Err(StoreError::Other(format!(
                "invalid invite transition {} -> {}",
                invite.status, status
            )));
        }
        invite.status = status;
        invite.updated_at = DateTime::now();
        Ok(())
    }

    async fn mark_email_sent(&self, code: &str) -> StoreResult<()> {
        let mut invites = self.invites.lock();
        let invite = invites
            .iter_mut()
            .find(|i| i.code == code)
            .ok_or(StoreError::NotFound)?;
        invite.email_sent = true;
        invite.email_sent_on = Some(DateTime::now());
        Ok(())
    }
}

/// Captures outgoing mail instead of delivering it.
pub struct RecordingMailer {
    enabled: AtomicBool,
    transport_down: AtomicBool,
    sent: Mutex<Vec<SendEmail>>,
}

impl RecordingMailer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            transport_down: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Make every send fail as if the relay refused the message.
    pub fn set_transport_down(&self, down: bool) {
        self.transport_down.store(down, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SendEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: SendEmail) -> Result<(), NotificationError> {
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(NotificationError::SmtpNotEnabled);
        }
        if self.transport_down.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport(
                "relay responded 502 Bad Gateway".to_string(),
            ));
        }
        self.sent.lock().push(email);
        Ok(())
    }
}

/// Search backend whose readiness and answers are set by the test.
pub struct StubSearch {
    readiness: Mutex<ReadinessCheck>,
    frames: Mutex<Vec<Frame>>,
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<DashboardQuery>>,
}

impl Default for StubSearch {
    fn default() -> Self {
        Self {
            readiness: Mutex::new(ReadinessCheck::ready()),
            frames: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl StubSearch {
    pub fn set_readiness(&self, readiness: ReadinessCheck) {
        *self.readiness.lock() = readiness;
    }

    pub fn respond_with(&self, frames: Vec<Frame>) {
        *self.frames.lock() = frames;
    }

    /// Answer every query with a backend error carrying `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn queries(&self) -> Vec<DashboardQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchService for StubSearch {
    async fn is_ready(&self, _org_id: ObjectId) -> ReadinessCheck {
        self.readiness.lock().clone()
    }

    async fn dashboard_query(
        &self,
        _user: &SignedInUser,
        _org_id: ObjectId,
        query: DashboardQuery,
    ) -> Result<Vec<Frame>, SearchError> {
        self.queries.lock().push(query);
        if let Some(message) = self.failure.lock().clone() {
            return Err(SearchError::Backend(message));
        }
        Ok(self.frames.lock().clone())
    }
}

/// Event bus whose channel is already shut down.
pub struct ClosedEventBus;

#[async_trait]
impl EventBus for ClosedEventBus {
    async fn publish(&self, _event: Event) -> Result<(), EventError> {
        Err(EventError::Closed)
    }
}

/// Counts what handlers report, keyed by metric name and `reason` label.
#[derive(Default)]
pub struct CountingMetrics {
    counters: DashMap<(&'static str, Option<String>), u64>,
}

impl CountingMetrics {
    fn inc(&self, name: &'static str, reason: Option<&str>) {
        *self
            .counters
            .entry((name, reason.map(str::to_owned)))
            .or_insert(0) += 1;
    }

    fn get(&self, name: &'static str, reason: Option<&str>) -> u64 {
        self.counters
            .get(&(name, reason.map(str::to_owned)))
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn not_served(&self, reason: &str) -> u64 {
        self.get(SEARCH_NOT_SERVED, Some(reason))
    }

    pub fn signups_completed(&self) -> u64 {
        self.get(SIGNUP_COMPLETED, None)
    }

    pub fn invite_signups(&self) -> u64 {
        self.get(SIGNUP_INVITE, None)
    }
}

impl MetricsSink for CountingMetrics {
    fn search_not_served(&self, reason: &str) {
        self.inc(SEARCH_NOT_SERVED, Some(reason));
    }

    fn signup_completed(&self, via_invite: bool) {
        self.inc(SIGNUP_COMPLETED, None);
        if via_invite {
            self.inc(SIGNUP_INVITE, None);
        }
    }
}
