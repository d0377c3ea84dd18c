use thiserror::Error;

use stockroom_core::{DomainError, UserId};

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: resource belongs to another user")]
    NotOwner,
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::Forbidden(value.to_string())
    }
}

/// Pure policy check: does the principal's role grant `required`?
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.has(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Self-or-admin check: the principal owns the resource, or holds `bypass`.
pub fn authorize_self_or(
    principal: &Principal,
    owner: UserId,
    bypass: &Permission,
) -> Result<(), AuthzError> {
    if principal.user_id == owner || principal.has(bypass) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn staff_denied_admin_permission() {
        let p = Principal::new(UserId::new(), Role::Staff);
        assert_eq!(
            authorize(&p, &Permission::USERS_MANAGE),
            Err(AuthzError::Forbidden("users.manage".to_string()))
        );
        assert!(authorize(&p, &Permission::SALES_CREATE).is_ok());
    }

    #[test]
    fn self_or_admin() {
        let me = UserId::new();
        let other = UserId::new();

        let staff = Principal::new(me, Role::Staff);
        assert!(authorize_self_or(&staff, me, &Permission::USERS_MANAGE).is_ok());
        assert_eq!(
            authorize_self_or(&staff, other, &Permission::USERS_MANAGE),
            Err(AuthzError::NotOwner)
        );

        let admin = Principal::new(me, Role::Admin);
        assert!(authorize_self_or(&admin, other, &Permission::USERS_MANAGE).is_ok());
    }
}
