pub mod access_control;
pub mod auth;
pub mod dao;
pub mod events;
pub mod identity;
pub mod metrics;
pub mod notifications;
pub mod search;
pub mod store;

pub use access_control::{AccessControl, RoleAccessControl};
pub use auth::AuthService;
pub use events::{BroadcastEventBus, Event, EventBus};
pub use identity::SignedInUser;
pub use metrics::{MetricsSink, RecorderMetrics};
pub use notifications::{Mailer, RelayMailer};
pub use search::{SearchClient, SearchService};
pub use store::{InviteStore, OrgStore, StoreError, StoreResult, UserStore};
