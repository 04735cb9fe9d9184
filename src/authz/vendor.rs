//! Fine-grained vendor permissions layered on top of the vendor role.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::decision::AuthzError;

/// Addressable flags of [`VendorPermissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorFlag {
    ProductsCreate,
    ProductsEdit,
    ProductsDelete,
    OrdersView,
    OrdersRefund,
    EarningsView,
    EarningsWithdraw,
    SettingsEditStore,
}

impl VendorFlag {
    pub const ALL: [VendorFlag; 8] = [
        VendorFlag::ProductsCreate,
        VendorFlag::ProductsEdit,
        VendorFlag::ProductsDelete,
        VendorFlag::OrdersView,
        VendorFlag::OrdersRefund,
        VendorFlag::EarningsView,
        VendorFlag::EarningsWithdraw,
        VendorFlag::SettingsEditStore,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            VendorFlag::ProductsCreate => "products.create",
            VendorFlag::ProductsEdit => "products.edit",
            VendorFlag::ProductsDelete => "products.delete",
            VendorFlag::OrdersView => "orders.view",
            VendorFlag::OrdersRefund => "orders.refund",
            VendorFlag::EarningsView => "earnings.view",
            VendorFlag::EarningsWithdraw => "earnings.withdraw",
            VendorFlag::SettingsEditStore => "settings.editStore",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        VendorFlag::ALL.iter().copied().find(|f| f.path() == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductPermissions {
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderPermissions {
    pub view: bool,
    pub refund: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EarningsPermissions {
    pub view: bool,
    pub withdraw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SettingsPermissions {
    #[serde(rename = "editStore")]
    pub edit_store: bool,
}

/// Delegated permissions for one vendor account.
///
/// Values are plain data: the record is replaced, never edited in place,
/// so a snapshot handed to the engine cannot change under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VendorPermissions {
    pub products: ProductPermissions,
    pub orders: OrderPermissions,
    pub earnings: EarningsPermissions,
    pub settings: SettingsPermissions,
}

impl Default for VendorPermissions {
    fn default() -> Self {
        Self {
            products: ProductPermissions { create: true, edit: true, delete: false },
            orders: OrderPermissions { view: true, refund: false },
            earnings: EarningsPermissions { view: true, withdraw: false },
            settings: SettingsPermissions { edit_store: true },
        }
    }
}

impl VendorPermissions {
    pub fn get(&self, flag: VendorFlag) -> bool {
        match flag {
            VendorFlag::ProductsCreate => self.products.create,
            VendorFlag::ProductsEdit => self.products.edit,
            VendorFlag::ProductsDelete => self.products.delete,
            VendorFlag::OrdersView => self.orders.view,
            VendorFlag::OrdersRefund => self.orders.refund,
            VendorFlag::EarningsView => self.earnings.view,
            VendorFlag::EarningsWithdraw => self.earnings.withdraw,
            VendorFlag::SettingsEditStore => self.settings.edit_store,
        }
    }

    /// Returns a copy with `flag` set to `value`.
    pub fn with(mut self, flag: VendorFlag, value: bool) -> Self {
        match flag {
            VendorFlag::ProductsCreate => self.products.create = value,
            VendorFlag::ProductsEdit => self.products.edit = value,
            VendorFlag::ProductsDelete => self.products.delete = value,
            VendorFlag::OrdersView => self.orders.view = value,
            VendorFlag::OrdersRefund => self.orders.refund = value,
            VendorFlag::EarningsView => self.earnings.view = value,
            VendorFlag::EarningsWithdraw => self.earnings.withdraw = value,
            VendorFlag::SettingsEditStore => self.settings.edit_store = value,
        }
        self
    }

    /// Looks up a flag by dotted path, e.g. `orders.refund`.
    pub fn flag(&self, path: &str) -> Result<bool, AuthzError> {
        VendorFlag::from_path(path)
            .map(|f| self.get(f))
            .ok_or_else(|| AuthzError::UnknownPermissionPath(path.to_string()))
    }
}

/// Safe defaults for a freshly provisioned vendor.
pub fn default_for(vendor_id: Uuid) -> VendorPermissions {
    tracing::debug!(vendor_id = %vendor_id, "default vendor permissions");
    VendorPermissions::default()
}

/// Merges a partial patch into `current` and returns the result.
///
/// The patch is nested (`{"earnings": {"withdraw": true}}`) or dotted
/// (`{"earnings.withdraw": true}`). Every path is validated before anything
/// is applied; `current` is never touched.
pub fn apply_override(current: &VendorPermissions, patch: &Value) -> Result<VendorPermissions, AuthzError> {
    let root = patch
        .as_object()
        .ok_or_else(|| AuthzError::InvalidPermissionValue("<root>".to_string()))?;

    let mut changes: HashMap<VendorFlag, bool> = HashMap::new();
    let mut record = |(flag, value): (VendorFlag, bool)| {
        // A flag may be named once per patch, dotted or nested.
        match changes.insert(flag, value) {
            Some(_) => Err(AuthzError::InvalidPermissionValue(flag.path().to_string())),
            None => Ok(()),
        }
    };

    for (key, value) in root {
        if key.contains('.') {
            record(parse_leaf(key, value)?)?;
            continue;
        }

        match value.as_object() {
            Some(group) => {
                for (leaf, leaf_value) in group {
                    let path = format!("{key}.{leaf}");
                    record(parse_leaf(&path, leaf_value)?)?;
                }
            }
            None => {
                let known_group = VendorFlag::ALL
                    .iter()
                    .any(|f| f.path().split('.').next() == Some(key.as_str()));
                return Err(if known_group {
                    AuthzError::InvalidPermissionValue(key.clone())
                } else {
                    AuthzError::UnknownPermissionPath(key.clone())
                });
            }
        }
    }

    Ok(changes
        .into_iter()
        .fold(*current, |acc, (flag, value)| acc.with(flag, value)))
}

fn parse_leaf(path: &str, value: &Value) -> Result<(VendorFlag, bool), AuthzError> {
    let flag = VendorFlag::from_path(path).ok_or_else(|| AuthzError::UnknownPermissionPath(path.to_string()))?;
    let value = value
        .as_bool()
        .ok_or_else(|| AuthzError::InvalidPermissionValue(path.to_string()))?;
    Ok((flag, value))
}
