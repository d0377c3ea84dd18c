//! Entity traits: identity and logical deletion.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Creation timestamp, used as the default listing order.
    fn created_at(&self) -> DateTime<Utc>;
}

/// Entities that are removed by stamping `deleted_at` instead of being erased.
pub trait SoftDelete: Entity {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn mark_deleted(&mut self, at: DateTime<Utc>);

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}
