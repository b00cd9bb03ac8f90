pub mod base;
pub mod invite;
pub mod org;
pub mod user;

pub use base::BaseDao;
pub use invite::InviteDao;
pub use org::OrgDao;
pub use user::UserDao;
