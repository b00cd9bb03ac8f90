use std::ops::Deref;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use orgdesk_services::{SignedInUser, StoreError};

use crate::{error::ApiError, state::AppState};

/// Extracts the authenticated user from JWT (cookie or Authorization header),
/// resolved against the organization they are currently acting in.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SignedInUser);

impl Deref for AuthUser {
    type Target = SignedInUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;

        let claims = app_state.auth.verify_access_token(&token)?;

        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        let user = match app_state.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(ApiError::Unauthorized("User not found".to_string()));
            }
            Err(e) => return Err(ApiError::internal("Failed to load signed in user", e)),
        };

        let org_id = user
            .org_id
            .ok_or_else(|| ApiError::Forbidden("No active organization".to_string()))?;

        let membership = match app_state.orgs.get_org_user(org_id, user_id).await {
            Ok(m) => m,
            Err(StoreError::NotFound) => {
                return Err(ApiError::Forbidden(
                    "Not a member of the active organization".to_string(),
                ));
            }
            Err(e) => return Err(ApiError::internal("Failed to load org membership", e)),
        };

        let org = app_state
            .orgs
            .get_by_id(org_id)
            .await
            .map_err(|e| ApiError::internal("Failed to load organization", e))?;

        Ok(AuthUser(SignedInUser {
            user_id,
            login: user.login,
            email: user.email,
            name: user.name,
            is_superuser: user.is_superuser,
            org_id,
            org_name: org.name,
            org_role: membership.role,
        }))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix("access_token=").map(|s| s.to_string()))
}
