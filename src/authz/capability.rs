use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::decision::AuthzError;
use super::vendor::VendorFlag;

/// Closed set of authorization-sensitive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ViewAllUsers,
    CreateUser,
    UpdateUserRole,
    DeleteUser,
    ViewCommission,
    EditCommissionRule,
    ManageStoreSettings,
    ManageStorePayments,
    RefundOrder,
    WithdrawEarnings,
    CreateProduct,
    EditProduct,
    DeleteProduct,
    ViewOrders,
    ViewEarnings,
    ManageVendorPermissions,
    /// Read one's own vendor override record
    ViewOwnVendorPermissions,
    /// Read another vendor's commission rate
    ViewVendorCommission,
    /// Hand out the `admin` or `owner` role
    AssignStaffRole,
}

impl Capability {
    pub const ALL: [Capability; 19] = [
        Capability::ViewAllUsers,
        Capability::CreateUser,
        Capability::UpdateUserRole,
        Capability::DeleteUser,
        Capability::ViewCommission,
        Capability::EditCommissionRule,
        Capability::ManageStoreSettings,
        Capability::ManageStorePayments,
        Capability::RefundOrder,
        Capability::WithdrawEarnings,
        Capability::CreateProduct,
        Capability::EditProduct,
        Capability::DeleteProduct,
        Capability::ViewOrders,
        Capability::ViewEarnings,
        Capability::ManageVendorPermissions,
        Capability::ViewOwnVendorPermissions,
        Capability::ViewVendorCommission,
        Capability::AssignStaffRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewAllUsers => "viewAllUsers",
            Capability::CreateUser => "createUser",
            Capability::UpdateUserRole => "updateUserRole",
            Capability::DeleteUser => "deleteUser",
            Capability::ViewCommission => "viewCommission",
            Capability::EditCommissionRule => "editCommissionRule",
            Capability::ManageStoreSettings => "manageStoreSettings",
            Capability::ManageStorePayments => "manageStorePayments",
            Capability::RefundOrder => "refundOrder",
            Capability::WithdrawEarnings => "withdrawEarnings",
            Capability::CreateProduct => "createProduct",
            Capability::EditProduct => "editProduct",
            Capability::DeleteProduct => "deleteProduct",
            Capability::ViewOrders => "viewOrders",
            Capability::ViewEarnings => "viewEarnings",
            Capability::ManageVendorPermissions => "manageVendorPermissions",
            Capability::ViewOwnVendorPermissions => "viewOwnVendorPermissions",
            Capability::ViewVendorCommission => "viewVendorCommission",
            Capability::AssignStaffRole => "assignStaffRole",
        }
    }

    /// The vendor override flag that further restricts this capability, if any.
    pub fn vendor_flag(&self) -> Option<VendorFlag> {
        match self {
            Capability::CreateProduct => Some(VendorFlag::ProductsCreate),
            Capability::EditProduct => Some(VendorFlag::ProductsEdit),
            Capability::DeleteProduct => Some(VendorFlag::ProductsDelete),
            Capability::ViewOrders => Some(VendorFlag::OrdersView),
            Capability::RefundOrder => Some(VendorFlag::OrdersRefund),
            Capability::ViewEarnings => Some(VendorFlag::EarningsView),
            Capability::WithdrawEarnings => Some(VendorFlag::EarningsWithdraw),
            Capability::ManageStoreSettings => Some(VendorFlag::SettingsEditStore),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| AuthzError::InvalidAction(s.to_string()))
    }
}
