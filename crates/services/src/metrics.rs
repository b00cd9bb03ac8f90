use metrics::counter;

pub const SEARCH_NOT_SERVED: &str = "dashboard_search_not_served_requests_total";
pub const SIGNUP_COMPLETED: &str = "api_user_signup_completed_total";
pub const SIGNUP_INVITE: &str = "api_user_signup_invite_total";

/// Where handlers report counters.
pub trait MetricsSink: Send + Sync {
    /// A search request answered with the placeholder because the index was not ready.
    fn search_not_served(&self, reason: &str);

    fn signup_completed(&self, via_invite: bool);
}

/// Records through the process-wide `metrics` recorder (the Prometheus
/// exporter installed by the binary).
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl MetricsSink for RecorderMetrics {
    fn search_not_served(&self, reason: &str) {
        counter!(SEARCH_NOT_SERVED, "reason" => reason.to_owned()).increment(1);
    }

    fn signup_completed(&self, via_invite: bool) {
        counter!(SIGNUP_COMPLETED).increment(1);
        if via_invite {
            counter!(SIGNUP_INVITE).increment(1);
        }
    }
}
