use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainResult, Entity, SoftDelete};

use crate::rules;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> DomainResult<()> {
        rules::length("name", &self.name, 3, 100)?;
        rules::max_length("description", &self.description, 500)
    }

    pub fn into_category(self, now: DateTime<Utc>) -> Category {
        Category {
            id: CategoryId::new(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl CategoryChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            rules::length("name", name, 3, 100)?;
        }
        if let Some(description) = &self.description {
            rules::max_length("description", description, 500)?;
        }
        Ok(())
    }
}

impl Category {
    pub fn apply(&mut self, changes: CategoryChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = description.trim().to_string();
        }
        self.updated_at = now;
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl SoftDelete for Category {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}
