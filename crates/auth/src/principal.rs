use serde::Serialize;

use stockroom_core::UserId;

use crate::{Permission, Role};

/// An authenticated caller, resolved from a live session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn has(&self, permission: &Permission) -> bool {
        self.role.permissions().contains(permission)
    }
}
