use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, SoftDelete, WarehouseId};

use crate::rules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: String,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWarehouse {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarehouseChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl NewWarehouse {
    pub fn validate(&self) -> DomainResult<()> {
        rules::length("code", &self.code, 3, 20)?;
        rules::length("name", &self.name, 3, 100)?;
        rules::max_length("address", &self.address, 500)
    }

    pub fn into_warehouse(self, now: DateTime<Utc>) -> Warehouse {
        Warehouse {
            id: WarehouseId::new(),
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl WarehouseChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(code) = &self.code {
            rules::length("code", code, 3, 20)?;
        }
        if let Some(name) = &self.name {
            rules::length("name", name, 3, 100)?;
        }
        if let Some(address) = &self.address {
            rules::max_length("address", address, 500)?;
        }
        Ok(())
    }
}

impl Warehouse {
    pub fn apply(&mut self, changes: WarehouseChanges, now: DateTime<Utc>) {
        if let Some(code) = changes.code {
            self.code = code.trim().to_string();
        }
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(address) = changes.address {
            self.address = address.trim().to_string();
        }
        self.updated_at = now;
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SoftDelete for Warehouse {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_length_is_enforced() {
        let w = NewWarehouse {
            code: "WH".to_string(),
            name: "Main warehouse".to_string(),
            address: String::new(),
        };
        assert!(w.validate().is_err());

        let w = NewWarehouse {
            code: "WH-01".to_string(),
            ..w
        };
        assert!(w.validate().is_ok());
    }
}
