//! Authorization module - role table, decision engine and vendor overrides
//!
//! This module implements the marketplace authorization model:
//! - A closed set of roles and capabilities
//! - A declarative role -> capability table, validated once at startup
//! - An unconditional guard against acting on one's own account
//! - Per-vendor permission flags that can only narrow what the role grants
//!
//! Everything here is pure: no I/O, no shared mutable state.

mod capability;
mod decision;
mod evaluator;
mod principal;
mod role;
mod table;
pub mod vendor;

pub use capability::Capability;
pub use decision::{AuthzError, Decision, DenyReason};
pub use evaluator::{AuthorizationEngine, PolicyEvaluator};
pub use principal::{Action, Actor, AuthzRequest, ResourceContext};
pub use role::Role;
pub use table::{PermissionTable, PermissionTableDocument};
pub use vendor::{apply_override, default_for, VendorFlag, VendorPermissions};
