use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. "sales.create").
///
/// Roles carry a fixed list of these; handlers name the one they need.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const USERS_MANAGE: Permission = Permission(Cow::Borrowed("users.manage"));
    pub const MASTER_DATA_MANAGE: Permission = Permission(Cow::Borrowed("master_data.manage"));
    pub const SALES_READ_ALL: Permission = Permission(Cow::Borrowed("sales.read_all"));
    pub const REPORTS_READ: Permission = Permission(Cow::Borrowed("reports.read"));
    pub const STOCK_UPDATE: Permission = Permission(Cow::Borrowed("stock.update"));
    pub const SALES_CREATE: Permission = Permission(Cow::Borrowed("sales.create"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
