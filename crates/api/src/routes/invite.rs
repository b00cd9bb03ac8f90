use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
};
use bson::oid::ObjectId;
use orgdesk_db::models::{InviteStatus, OrgRole, User, user::fallback};
use orgdesk_services::{
    SignedInUser, StoreError,
    access_control::{ALL_USERS_SCOPE, actions, scope},
    events::Event,
    notifications::{EmailTemplate, NotificationError, SendEmail, is_email},
    store::{AddOrgUser, CreateInvite, CreateUser, InviteView, new_invite_code},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::{auth::AuthUser, json::JsonBody, remote::RemoteAddr},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddInviteForm {
    #[validate(length(min = 1))]
    pub login_or_email: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub send_email: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInviteForm {
    #[validate(length(min = 1))]
    pub invite_code: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            user_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub email: String,
    pub role: OrgRole,
    pub invited_by_login: String,
    pub invited_by_email: String,
    pub invited_by_name: String,
    pub code: String,
    pub status: InviteStatus,
    pub url: String,
    pub email_sent: bool,
    pub email_sent_on: Option<String>,
    pub created_on: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteInfo {
    pub email: String,
    pub name: String,
    pub username: String,
    pub invited_by: String,
}

fn invite_url(state: &AppState, code: &str) -> String {
    state.settings.app.to_abs_url(&format!("invite/{code}"))
}

fn to_response(state: &AppState, view: InviteView) -> InviteResponse {
    let url = invite_url(state, &view.invite.code);
    let i = view.invite;
    InviteResponse {
        id: i.id.map(|id| id.to_hex()).unwrap_or_default(),
        org_id: i.org_id.to_hex(),
        name: i.name,
        email: i.email,
        role: i.role,
        invited_by_login: view.invited_by_login,
        invited_by_email: view.invited_by_email,
        invited_by_name: view.invited_by_name,
        code: i.code,
        status: i.status,
        url,
        email_sent: i.email_sent,
        email_sent_on: i
            .email_sent_on
            .and_then(|t| t.try_to_rfc3339_string().ok()),
        created_on: i.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

async fn require_org_users_add(state: &AppState, user: &SignedInUser) -> Result<(), ApiError> {
    let allowed = state
        .access
        .evaluate(user, actions::ORG_USERS_ADD, ALL_USERS_SCOPE)
        .await
        .map_err(|e| ApiError::internal("Failed to evaluate permissions", e))?;
    if !allowed {
        return Err(ApiError::Forbidden("Permission denied".to_string()));
    }
    Ok(())
}

async fn update_invite_status(
    state: &AppState,
    code: &str,
    status: InviteStatus,
) -> Result<(), ApiError> {
    state
        .invites
        .update_status(code, status)
        .await
        .map_err(|e| ApiError::internal("Failed to update invite status", e))?;
    info!(code, %status, "Invite status updated");
    Ok(())
}

/// Pending invites of the caller's organization.
pub async fn list_pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InviteResponse>>, ApiError> {
    require_org_users_add(&state, &auth).await?;

    let invites = state
        .invites
        .list_by_status(auth.org_id, InviteStatus::Pending)
        .await
        .map_err(|e| ApiError::internal("Failed to get invites from db", e))?;

    Ok(Json(
        invites
            .into_iter()
            .map(|view| to_response(&state, view))
            .collect(),
    ))
}

/// Invites someone into the caller's organization.
///
/// An existing account (matched by login or email) is added to the org right
/// away and no invite record is written. Anyone else gets a pending invite.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    RemoteAddr(remote_addr): RemoteAddr,
    JsonBody(form): JsonBody<AddInviteForm>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_org_users_add(&state, &auth).await?;

    let role: OrgRole = form
        .role
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid role specified".to_string()))?;
    if !auth.org_role.includes(role) && !auth.is_superuser {
        return Err(ApiError::Forbidden(
            "Cannot assign a role higher than user's role".to_string(),
        ));
    }

    match state.users.get_by_login(&form.login_or_email).await {
        Ok(user) => {
            let user_id = user
                .id
                .ok_or_else(|| ApiError::internal("Failed to load existing user", "missing id"))?;
            let user_scope = scope("users", "id", &user_id.to_hex());
            let allowed = state
                .access
                .evaluate(&auth, actions::ORG_USERS_ADD, &user_scope)
                .await
                .map_err(|e| ApiError::internal("Failed to evaluate permissions", e))?;
            if !allowed {
                return Err(ApiError::Forbidden(
                    "Permission denied: not permitted to add an existing user to this organisation"
                        .to_string(),
                ));
            }
            return invite_existing_user(&state, &auth, user, user_id, role, &form).await;
        }
        Err(StoreError::NotFound) => {}
        Err(e) => {
            return Err(ApiError::internal(
                "Failed to query db for existing user check",
                e,
            ));
        }
    }

    if state.settings.auth.disable_login_form {
        return Err(ApiError::BadRequest(
            "Cannot invite when login is disabled.".to_string(),
        ));
    }

    let invite = state
        .invites
        .create(CreateInvite {
            org_id: auth.org_id,
            code: new_invite_code(),
            email: form.login_or_email.clone(),
            name: form.name.clone(),
            role,
            invited_by_user_id: auth.user_id,
            remote_addr,
        })
        .await
        .map_err(|e| ApiError::internal("Failed to save invite to database", e))?;
    info!(org_id = %auth.org_id, code = %invite.code, %role, "Invite created");

    if !(form.send_email && is_email(&form.login_or_email)) {
        return Ok(Json(MessageResponse::new(format!(
            "Created invite for {}",
            form.login_or_email
        ))));
    }

    let data = BTreeMap::from([
        (
            "Name".to_string(),
            fallback(&[&invite.name, &invite.email]).to_string(),
        ),
        ("OrgName".to_string(), auth.org_name.clone()),
        ("Email".to_string(), auth.email.clone()),
        ("LinkUrl".to_string(), invite_url(&state, &invite.code)),
        ("InvitedBy".to_string(), auth.display_name().to_string()),
    ]);
    let sent = state
        .mailer
        .send(SendEmail {
            to: vec![form.login_or_email.clone()],
            template: EmailTemplate::NewUserInvite,
            data,
        })
        .await;
    match sent {
        Ok(()) => {}
        Err(e @ NotificationError::SmtpNotEnabled) => {
            return Err(ApiError::precondition(e.to_string()));
        }
        Err(e) => return Err(ApiError::internal("Failed to send email invite", e)),
    }

    state
        .invites
        .mark_email_sent(&invite.code)
        .await
        .map_err(|e| ApiError::internal("Failed to update invite with email sent info", e))?;

    Ok(Json(MessageResponse::new(format!(
        "Sent invite to {}",
        form.login_or_email
    ))))
}

async fn invite_existing_user(
    state: &AppState,
    auth: &SignedInUser,
    user: User,
    user_id: ObjectId,
    role: OrgRole,
    form: &AddInviteForm,
) -> Result<Json<MessageResponse>, ApiError> {
    match state
        .orgs
        .add_org_user(AddOrgUser {
            org_id: auth.org_id,
            user_id,
            role,
        })
        .await
    {
        Ok(_) => {}
        Err(StoreError::AlreadyExists(_)) => {
            return Err(ApiError::precondition(format!(
                "User {} is already added to organization",
                form.login_or_email
            )));
        }
        Err(e) => return Err(ApiError::internal("Error while trying to create org user", e)),
    }

    if form.send_email && is_email(&user.email) {
        let data = BTreeMap::from([
            ("Name".to_string(), user.name_or_fallback().to_string()),
            ("OrgName".to_string(), auth.org_name.clone()),
            ("InvitedBy".to_string(), auth.display_name().to_string()),
        ]);
        state
            .mailer
            .send(SendEmail {
                to: vec![user.email.clone()],
                template: EmailTemplate::InvitedToOrg,
                data,
            })
            .await
            .map_err(|e| ApiError::internal("Failed to send email invited_to_org", e))?;
    }

    info!(org_id = %auth.org_id, %user_id, %role, "Existing user added to org");
    Ok(Json(MessageResponse {
        message: format!(
            "Existing user {} added to org {}",
            user.name_or_fallback(),
            auth.org_name
        ),
        user_id: Some(user_id.to_hex()),
    }))
}

pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_org_users_add(&state, &auth).await?;

    // Codes belonging to another org are indistinguishable from unknown ones.
    let view = state
        .invites
        .get_by_code(&code)
        .await
        .map_err(|e| ApiError::internal("Failed to update invite status", e))?;
    if view.invite.org_id != auth.org_id {
        return Err(ApiError::internal(
            "Failed to update invite status",
            StoreError::NotFound,
        ));
    }

    update_invite_status(&state, &code, InviteStatus::Revoked).await?;
    Ok(Json(MessageResponse::new("Invite revoked")))
}

/// Public lookup used by the sign-up page. Only pending invites are visible.
pub async fn get_info(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InviteInfo>, ApiError> {
    let view = match state.invites.get_by_code(&code).await {
        Ok(view) => view,
        Err(StoreError::NotFound) => return Err(ApiError::NotFound("Invite not found".to_string())),
        Err(e) => return Err(ApiError::internal("Failed to get invite", e)),
    };

    if view.invite.status != InviteStatus::Pending {
        return Err(ApiError::NotFound("Invite not found".to_string()));
    }

    Ok(Json(InviteInfo {
        invited_by: view.invited_by().to_string(),
        email: view.invite.email.clone(),
        name: view.invite.name,
        username: view.invite.email,
    }))
}

/// Signs up through an invite and logs the new user in.
///
/// The steps run one after another without a transaction: if a later step
/// fails, the account and membership created before it stay in place.
pub async fn complete(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<CompleteInviteForm>,
) -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let view = match state.invites.get_by_code(&form.invite_code).await {
        Ok(view) => view,
        Err(StoreError::NotFound) => return Err(ApiError::NotFound("Invite not found".to_string())),
        Err(e) => return Err(ApiError::internal("Failed to get invite", e)),
    };
    let invite = view.invite;

    if invite.status != InviteStatus::Pending {
        return Err(ApiError::precondition(format!(
            "Invite cannot be used in status {}",
            invite.status
        )));
    }

    let login = if form.username.is_empty() {
        form.email.clone()
    } else {
        form.username.clone()
    };
    let password_hash = state.auth.hash_password(&form.password)?;

    let user = match state
        .users
        .create(CreateUser {
            email: form.email.clone(),
            login,
            name: form.name.clone(),
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::AlreadyExists(_)) => {
            return Err(ApiError::precondition(format!(
                "User with email '{}' or username '{}' already exists",
                form.email, form.username
            )));
        }
        Err(e) => return Err(ApiError::internal("failed to create user", e)),
    };
    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal("failed to create user", "missing id"))?;

    state
        .events
        .publish(Event::SignUpCompleted {
            name: user.name_or_fallback().to_string(),
            email: user.email.clone(),
        })
        .await
        .map_err(|e| ApiError::internal("failed to publish event", e))?;

    match state
        .orgs
        .add_org_user(AddOrgUser {
            org_id: invite.org_id,
            user_id,
            role: invite.role,
        })
        .await
    {
        Ok(_) | Err(StoreError::AlreadyExists(_)) => {}
        Err(e) => return Err(ApiError::internal("Error while trying to create org user", e)),
    }

    update_invite_status(&state, &invite.code, InviteStatus::Completed).await?;

    state
        .users
        .set_using_org(user_id, invite.org_id)
        .await
        .map_err(|e| ApiError::internal("Failed to set org as active", e))?;

    let session = state
        .auth
        .issue_session(&user)
        .map_err(|e| ApiError::internal("failed to accept invite", e))?;
    let cookie = HeaderValue::from_str(&session.cookie())
        .map_err(|e| ApiError::internal("failed to accept invite", e))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    state.metrics.signup_completed(true);
    info!(org_id = %invite.org_id, %user_id, code = %invite.code, "Invite completed");

    Ok((
        headers,
        Json(MessageResponse {
            message: "User created and logged in".to_string(),
            user_id: Some(user_id.to_hex()),
        }),
    ))
}
