pub mod authz;
pub mod commission;
pub mod store;
pub mod user;
pub mod vendor;
