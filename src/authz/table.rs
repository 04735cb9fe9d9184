use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::capability::Capability;
use super::decision::AuthzError;
use super::role::Role;

const BUILTIN_TABLE: &str = include_str!("../../config/permissions.json");

/// Declarative form of the table, as stored in `config/permissions.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionTableDocument {
    pub roles: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "nonSelfApplicable")]
    pub non_self_applicable: Vec<String>,
}

/// Role to capability-set mapping. Immutable once built.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Capability>>,
    non_self_applicable: HashSet<Capability>,
}

impl PermissionTable {
    pub fn builtin() -> Result<Self, AuthzError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Loads the table named by `PERMISSION_TABLE_PATH`, or the built-in one.
    pub fn from_env() -> Result<Self, AuthzError> {
        match std::env::var("PERMISSION_TABLE_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => Self::builtin(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AuthzError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthzError::InvalidTable(format!("failed to read {}: {e}", path.display())))?;
        let table = Self::from_json(&raw)?;
        tracing::info!(path = %path.display(), "loaded permission table");
        Ok(table)
    }

    pub fn from_json(raw: &str) -> Result<Self, AuthzError> {
        let doc: PermissionTableDocument =
            serde_json::from_str(raw).map_err(|e| AuthzError::InvalidTable(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: PermissionTableDocument) -> Result<Self, AuthzError> {
        let mut grants: HashMap<Role, HashSet<Capability>> = HashMap::new();

        for (role_name, caps) in &doc.roles {
            let role: Role = role_name
                .parse()
                .map_err(|_| AuthzError::InvalidTable(format!("unknown role '{role_name}'")))?;
            if grants.contains_key(&role) {
                return Err(AuthzError::InvalidTable(format!("role '{role}' listed twice")));
            }

            let mut set = HashSet::new();
            for cap_name in caps {
                let cap: Capability = cap_name.parse().map_err(|_| {
                    AuthzError::InvalidTable(format!("unknown capability '{cap_name}' for role '{role}'"))
                })?;
                set.insert(cap);
            }
            grants.insert(role, set);
        }

        for role in Role::ALL {
            if !grants.contains_key(&role) {
                return Err(AuthzError::InvalidTable(format!("missing entry for role '{role}'")));
            }
        }

        for cap in Capability::ALL {
            if !grants.values().any(|set| set.contains(&cap)) {
                return Err(AuthzError::InvalidTable(format!("capability '{cap}' is not granted to any role")));
            }
        }

        let non_self_applicable = doc
            .non_self_applicable
            .iter()
            .map(|name| {
                name.parse::<Capability>()
                    .map_err(|_| AuthzError::InvalidTable(format!("unknown non-self-applicable capability '{name}'")))
            })
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Self { grants, non_self_applicable })
    }

    pub fn grants(&self, role: Role, capability: Capability) -> bool {
        self.grants.get(&role).is_some_and(|set| set.contains(&capability))
    }

    pub fn is_non_self_applicable(&self, capability: Capability) -> bool {
        self.non_self_applicable.contains(&capability)
    }

    /// Capabilities held by `role`, in declaration order.
    pub fn capabilities_for(&self, role: Role) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.grants(role, *c))
            .collect()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
