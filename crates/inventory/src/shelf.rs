use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, ShelfId, SoftDelete, WarehouseId};

use crate::rules;

/// A storage location inside one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: ShelfId,
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewShelf {
    pub warehouse_id: WarehouseId,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShelfChanges {
    pub warehouse_id: Option<WarehouseId>,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl NewShelf {
    pub fn validate(&self) -> DomainResult<()> {
        rules::length("code", &self.code, 3, 20)?;
        rules::length("name", &self.name, 3, 100)
    }

    pub fn into_shelf(self, now: DateTime<Utc>) -> Shelf {
        Shelf {
            id: ShelfId::new(),
            warehouse_id: self.warehouse_id,
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl ShelfChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(code) = &self.code {
            rules::length("code", code, 3, 20)?;
        }
        if let Some(name) = &self.name {
            rules::length("name", name, 3, 100)?;
        }
        Ok(())
    }
}

impl Shelf {
    pub fn apply(&mut self, changes: ShelfChanges, now: DateTime<Utc>) {
        if let Some(warehouse_id) = changes.warehouse_id {
            self.warehouse_id = warehouse_id;
        }
        if let Some(code) = changes.code {
            self.code = code.trim().to_string();
        }
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        self.updated_at = now;
    }
}

impl Entity for Shelf {
    type Id = ShelfId;

    fn id(&self) -> ShelfId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SoftDelete for Shelf {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}
