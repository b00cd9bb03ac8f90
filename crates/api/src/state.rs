use mongodb::Database;
use orgdesk_config::Settings;
use orgdesk_services::{
    AccessControl, AuthService, BroadcastEventBus, EventBus, InviteStore, Mailer, MetricsSink,
    OrgStore, RecorderMetrics, RelayMailer, RoleAccessControl, SearchClient, SearchService,
    UserStore,
    dao::{InviteDao, OrgDao, UserDao},
};
use std::sync::Arc;

/// Shared handler state. Every collaborator sits behind a trait object so the
/// router can run against MongoDB in production and in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<dyn UserStore>,
    pub orgs: Arc<dyn OrgStore>,
    pub invites: Arc<dyn InviteStore>,
    pub mailer: Arc<dyn Mailer>,
    pub events: Arc<dyn EventBus>,
    pub access: Arc<dyn AccessControl>,
    pub search: Arc<dyn SearchService>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings, events: Arc<BroadcastEventBus>) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let orgs = Arc::new(OrgDao::new(&db));
        let invites = Arc::new(InviteDao::new(&db));
        let mailer = Arc::new(RelayMailer::new(settings.smtp.clone()));
        let access = Arc::new(RoleAccessControl::new(settings.auth.editors_can_admin));
        let search = Arc::new(SearchClient::new(settings.search.url.clone()));
        let metrics = Arc::new(RecorderMetrics);

        Self {
            settings,
            auth,
            users,
            orgs,
            invites,
            mailer,
            events,
            access,
            search,
            metrics,
        }
    }
}
