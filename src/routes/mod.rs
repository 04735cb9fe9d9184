pub mod auth;
pub mod authz;
pub mod commissions;
pub mod health;
pub mod store;
pub mod users;
pub mod vendors;
