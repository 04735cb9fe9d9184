use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::decision::AuthzError;

/// The single role held by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    /// Store operator. Older accounts carry the spelling `seller`.
    #[serde(alias = "seller")]
    Vendor,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Client, Role::Vendor, Role::Admin, Role::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// Back-office staff: `owner` or `admin`.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    /// Anyone allowed into the vendor dashboard.
    pub fn is_vendor(&self) -> bool {
        matches!(self, Role::Vendor | Role::Admin | Role::Owner)
    }

    /// Every authenticated account can shop.
    pub fn is_client(&self) -> bool {
        true
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    pub fn is_any_of(&self, roles: &[Role]) -> bool {
        roles.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "vendor" | "seller" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            _ => Err(AuthzError::InvalidActor(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_is_an_alias_for_vendor() {
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!("Vendor".parse::<Role>().unwrap(), Role::Vendor);
        let role: Role = serde_json::from_str("\"seller\"").unwrap();
        assert_eq!(role, Role::Vendor);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"vendor\"");
    }

    #[test]
    fn unknown_role_is_invalid_actor() {
        let err = "manager".parse::<Role>().unwrap_err();
        assert!(matches!(err, AuthzError::InvalidActor(ref r) if r == "manager"));
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn predicates_are_set_membership() {
        assert!(Role::Owner.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Vendor.is_admin());
        assert!(Role::Admin.is_vendor());
        assert!(!Role::Client.is_vendor());
        assert!(Role::ALL.iter().all(|r| r.is_client()));
        assert!(Role::Vendor.is_any_of(&[Role::Client, Role::Vendor]));
    }
}
