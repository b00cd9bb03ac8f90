use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DashboardQuery, Frame, ReadinessCheck, SearchError, SearchService};
use crate::identity::SignedInUser;

/// Client for the internal search service.
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    org_id: String,
    user: QueryUser<'a>,
    query: &'a DashboardQuery,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryUser<'a> {
    id: String,
    login: &'a str,
    org_role: &'a str,
    is_superuser: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    frames: Vec<Frame>,
    #[serde(default)]
    error: Option<String>,
}

impl SearchClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_readiness(&self, org_id: ObjectId) -> Result<ReadinessCheck, reqwest::Error> {
        self.client
            .get(format!("{}/ready", self.base_url))
            .query(&[("orgId", org_id.to_hex())])
            .send()
            .await?
            .error_for_status()?
            .json::<ReadinessCheck>()
            .await
    }
}

#[async_trait]
impl SearchService for SearchClient {
    async fn is_ready(&self, org_id: ObjectId) -> ReadinessCheck {
        match self.fetch_readiness(org_id).await {
            Ok(check) => check,
            Err(e) => {
                warn!(error = %e, %org_id, "Search readiness check failed");
                ReadinessCheck::not_ready("search-unreachable")
            }
        }
    }

    async fn dashboard_query(
        &self,
        user: &SignedInUser,
        org_id: ObjectId,
        query: DashboardQuery,
    ) -> Result<Vec<Frame>, SearchError> {
        let resp = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&QueryRequest {
                org_id: org_id.to_hex(),
                user: QueryUser {
                    id: user.user_id.to_hex(),
                    login: &user.login,
                    org_role: user.org_role.as_str(),
                    is_superuser: user.is_superuser,
                },
                query: &query,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<QueryResponse>()
            .await?;

        if let Some(error) = resp.error {
            return Err(SearchError::Backend(error));
        }
        Ok(resp.frames)
    }
}
