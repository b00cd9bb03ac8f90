pub mod client;
pub mod frame;

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::SignedInUser;

pub use client::SearchClient;
pub use frame::{Field, Frame};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FacetField {
    pub field: String,
    pub limit: usize,
}

/// Dashboard search request as posted by the UI. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardQuery {
    pub query: String,
    pub location: String,
    pub sort: String,
    pub tags: Vec<String>,
    pub kind: Vec<String>,
    pub uid: Vec<String>,
    pub explain: bool,
    pub with_allowed_actions: bool,
    pub facet: Vec<FacetField>,
    pub skip_location: bool,
    pub has_preview: String,
    pub limit: usize,
    pub from: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessCheck {
    pub is_ready: bool,
    #[serde(default)]
    pub reason: String,
}

impl ReadinessCheck {
    pub fn ready() -> Self {
        Self {
            is_ready: true,
            reason: String::new(),
        }
    }

    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            is_ready: false,
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait SearchService: Send + Sync {
    /// Whether the index for `org_id` is warm enough to answer queries.
    async fn is_ready(&self, org_id: ObjectId) -> ReadinessCheck;

    /// Runs a query. A well-behaved backend returns exactly one frame.
    async fn dashboard_query(
        &self,
        user: &SignedInUser,
        org_id: ObjectId,
        query: DashboardQuery,
    ) -> Result<Vec<Frame>, SearchError>;
}
