use std::{net::SocketAddr, sync::Arc};

use metrics_exporter_prometheus::PrometheusHandle;
use orgdesk_api::{build_router, metrics_routes, state::AppState};
use orgdesk_config::{
    AppSettings, AuthSettings, DatabaseSettings, JwtSettings, SearchSettings, Settings,
    SmtpSettings,
};
use orgdesk_services::{AuthService, BroadcastEventBus, RoleAccessControl};
use tokio::net::TcpListener;

use super::memory::{
    CountingMetrics, MemoryInvites, MemoryOrgs, MemoryUsers, RecordingMailer, StubSearch,
};

/// A running test application backed by in-memory collaborators.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub settings: Settings,
    pub client: reqwest::Client,
    pub auth: Arc<AuthService>,
    pub users: Arc<MemoryUsers>,
    pub orgs: Arc<MemoryOrgs>,
    pub invites: Arc<MemoryInvites>,
    pub mailer: Arc<RecordingMailer>,
    pub events: Arc<BroadcastEventBus>,
    pub search: Arc<StubSearch>,
    pub metrics: Arc<CountingMetrics>,
}

impl TestApp {
    /// Spawn a test server on a random local port.
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(|_| {}).await
    }

    /// Spawn a test server with customized settings.
    ///
    /// The `mutator` closure receives a `&mut Settings` after defaults are applied,
    /// allowing tests to tweak specific fields (e.g., `auth.disable_login_form`).
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        Self::build(mutator, |_| {}, None).await
    }

    /// Spawn a test server after swapping collaborators in the assembled state.
    /// Fields of `TestApp` still point at the defaults that were replaced.
    pub async fn spawn_with_state(mutator: impl FnOnce(&mut AppState)) -> Self {
        Self::build(|_| {}, mutator, None).await
    }

    /// Spawn a test server that also serves `/metrics` from `handle`.
    pub async fn spawn_with_prometheus(
        handle: PrometheusHandle,
        mutator: impl FnOnce(&mut AppState),
    ) -> Self {
        Self::build(|_| {}, mutator, Some(handle)).await
    }

    async fn build(
        settings_mutator: impl FnOnce(&mut Settings),
        state_mutator: impl FnOnce(&mut AppState),
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let mut settings = test_settings();
        settings_mutator(&mut settings);

        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(MemoryUsers::default());
        let orgs = Arc::new(MemoryOrgs::default());
        let invites = Arc::new(MemoryInvites::new(users.clone()));
        let mailer = Arc::new(RecordingMailer::new(settings.smtp.enabled));
        let events = Arc::new(BroadcastEventBus::new(16));
        let search = Arc::new(StubSearch::default());
        let metrics = Arc::new(CountingMetrics::default());

        let mut app_state = AppState {
            settings: settings.clone(),
            auth: auth.clone(),
            users: users.clone(),
            orgs: orgs.clone(),
            invites: invites.clone(),
            mailer: mailer.clone(),
            events: events.clone(),
            access: Arc::new(RoleAccessControl::new(settings.auth.editors_can_admin)),
            search: search.clone(),
            metrics: metrics.clone(),
        };
        state_mutator(&mut app_state);
        let mut app = build_router(app_state);
        if let Some(handle) = prometheus {
            app = app.merge(metrics_routes(handle));
        }

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            settings,
            client,
            auth,
            users,
            orgs,
            invites,
            mailer,
            events,
            search,
            metrics,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn test_settings() -> Settings {
    Settings {
        app: AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            root_url: "http://orgdesk.test/".to_string(),
            cors_origins: vec![],
        },
        database: DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "orgdesk_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            issuer: "orgdesk".to_string(),
        },
        auth: AuthSettings {
            disable_login_form: false,
            editors_can_admin: false,
        },
        smtp: SmtpSettings {
            enabled: true,
            relay_url: "http://localhost:8025/send".to_string(),
            from_address: "admin@orgdesk.test".to_string(),
            from_name: "orgdesk".to_string(),
        },
        search: SearchSettings {
            url: "http://localhost:8081".to_string(),
        },
    }
}
