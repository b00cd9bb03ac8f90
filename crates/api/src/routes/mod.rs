pub mod invite;
pub mod search;
