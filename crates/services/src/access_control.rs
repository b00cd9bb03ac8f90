use async_trait::async_trait;
use orgdesk_db::models::permissions;

use crate::identity::SignedInUser;

pub mod actions {
    pub const ORG_USERS_ADD: &str = "org.users:add";
}

/// Builds a scope such as `users:id:42`.
pub fn scope(kind: &str, attribute: &str, value: &str) -> String {
    format!("{kind}:{attribute}:{value}")
}

/// Scope covering every user.
pub const ALL_USERS_SCOPE: &str = "users:*";

/// Decides whether a caller may perform `action` on `scope`.
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn evaluate(
        &self,
        user: &SignedInUser,
        action: &str,
        scope: &str,
    ) -> anyhow::Result<bool>;
}

/// Grants permissions from the caller's org role. Superusers pass everything.
///
/// Scopes are not narrowed further: a role that holds an action holds it for
/// every resource inside the caller's organization.
pub struct RoleAccessControl {
    editors_can_admin: bool,
}

impl RoleAccessControl {
    pub fn new(editors_can_admin: bool) -> Self {
        Self { editors_can_admin }
    }
}

#[async_trait]
impl AccessControl for RoleAccessControl {
    async fn evaluate(
        &self,
        user: &SignedInUser,
        action: &str,
        scope: &str,
    ) -> anyhow::Result<bool> {
        if user.is_superuser {
            return Ok(true);
        }

        let flag = permissions::for_action(action)
            .ok_or_else(|| anyhow::anyhow!("unknown action {action}"))?;
        let granted = user.org_role.permissions(self.editors_can_admin);
        let allowed = permissions::has(granted, flag);

        tracing::debug!(
            user_id = %user.user_id,
            role = %user.org_role,
            action,
            scope,
            allowed,
            "Evaluated permission"
        );
        Ok(allowed)
    }
}
