use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;

use crate::Permission;

/// Static role set. Each role maps to a fixed permission list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Admin,
    SuperAdmin,
}

const STAFF_PERMISSIONS: &[Permission] = &[Permission::STOCK_UPDATE, Permission::SALES_CREATE];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::USERS_MANAGE,
    Permission::MASTER_DATA_MANAGE,
    Permission::SALES_READ_ALL,
    Permission::REPORTS_READ,
    Permission::STOCK_UPDATE,
    Permission::SALES_CREATE,
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Staff => STAFF_PERMISSIONS,
            Role::Admin | Role::SuperAdmin => ADMIN_PERMISSIONS,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Whether a holder of `self` may create a user with, or grant, `target`.
    ///
    /// Staff grant nothing; admins grant up to admin; only super admins grant
    /// super admin.
    pub fn can_assign(&self, target: Role) -> bool {
        match self {
            Role::Staff => false,
            Role::Admin => target != Role::SuperAdmin,
            Role::SuperAdmin => true,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(DomainError::invalid(format!(
                "role must be one of staff, admin, super_admin; got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_cannot_manage() {
        assert!(!Role::Staff.permissions().contains(&Permission::USERS_MANAGE));
        assert!(!Role::Staff.permissions().contains(&Permission::MASTER_DATA_MANAGE));
        assert!(Role::Staff.permissions().contains(&Permission::SALES_CREATE));
        assert!(Role::Staff.permissions().contains(&Permission::STOCK_UPDATE));
    }

    #[test]
    fn only_super_admin_grants_super_admin() {
        assert!(Role::SuperAdmin.can_assign(Role::SuperAdmin));
        assert!(!Role::Admin.can_assign(Role::SuperAdmin));
        assert!(Role::Admin.can_assign(Role::Admin));
        assert!(Role::Admin.can_assign(Role::Staff));
        assert!(!Role::Staff.can_assign(Role::Staff));
    }

    #[test]
    fn parses_wire_names() {
        for role in [Role::Staff, Role::Admin, Role::SuperAdmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }
}
