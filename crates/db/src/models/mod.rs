pub mod invite;
pub mod org;
pub mod role;
pub mod user;

pub use invite::{Invite, InviteStatus};
pub use org::{Org, OrgUser};
pub use role::{OrgRole, permissions};
pub use user::User;
