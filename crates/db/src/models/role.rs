use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role a user holds inside one organization. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrgRole {
    Viewer,
    Editor,
    Admin,
}

impl OrgRole {
    /// True when a holder of `self` may hand out `other`.
    pub fn includes(self, other: OrgRole) -> bool {
        self >= other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Viewer => "Viewer",
            OrgRole::Editor => "Editor",
            OrgRole::Admin => "Admin",
        }
    }

    /// Permission bits granted by the role alone.
    pub fn permissions(self, editors_can_admin: bool) -> u64 {
        match self {
            OrgRole::Admin => permissions::ORG_ADMIN,
            OrgRole::Editor if editors_can_admin => {
                permissions::ORG_EDITOR | permissions::ORG_USERS_ALL
            }
            OrgRole::Editor => permissions::ORG_EDITOR,
            OrgRole::Viewer => permissions::ORG_VIEWER,
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct InvalidRole(pub String);

impl FromStr for OrgRole {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Viewer" => Ok(OrgRole::Viewer),
            "Editor" => Ok(OrgRole::Editor),
            "Admin" => Ok(OrgRole::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

/// Permission bits (u64 bitfield)
pub mod permissions {
    pub const DASHBOARDS_READ: u64 = 1 << 0;
    pub const DASHBOARDS_WRITE: u64 = 1 << 1;
    pub const SEARCH: u64 = 1 << 2;
    pub const ORG_READ: u64 = 1 << 3;
    pub const ORG_WRITE: u64 = 1 << 4;
    pub const ORG_USERS_READ: u64 = 1 << 5;
    pub const ORG_USERS_ADD: u64 = 1 << 6;
    pub const ORG_USERS_WRITE: u64 = 1 << 7;
    pub const ORG_USERS_REMOVE: u64 = 1 << 8;

    pub const ORG_USERS_ALL: u64 =
        ORG_USERS_READ | ORG_USERS_ADD | ORG_USERS_WRITE | ORG_USERS_REMOVE;

    pub const ORG_VIEWER: u64 = DASHBOARDS_READ | SEARCH | ORG_READ;
    pub const ORG_EDITOR: u64 = ORG_VIEWER | DASHBOARDS_WRITE;
    pub const ORG_ADMIN: u64 = ORG_EDITOR | ORG_WRITE | ORG_USERS_ALL;

    /// Maps an action name to its bit. Unknown actions map to nothing.
    pub fn for_action(action: &str) -> Option<u64> {
        match action {
            "dashboards:read" => Some(DASHBOARDS_READ),
            "dashboards:write" => Some(DASHBOARDS_WRITE),
            "search:query" => Some(SEARCH),
            "orgs:read" => Some(ORG_READ),
            "orgs:write" => Some(ORG_WRITE),
            "org.users:read" => Some(ORG_USERS_READ),
            "org.users:add" => Some(ORG_USERS_ADD),
            "org.users:write" => Some(ORG_USERS_WRITE),
            "org.users:remove" => Some(ORG_USERS_REMOVE),
            _ => None,
        }
    }

    pub fn has(permissions: u64, flag: u64) -> bool {
        permissions & flag == flag
    }
}
