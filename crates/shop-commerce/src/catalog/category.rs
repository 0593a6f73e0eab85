//! Category types for product organization.

use crate::catalog::slug::slugify;
use crate::current_timestamp;
use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category in the catalog hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique category identifier.
    pub id: CategoryId,
    /// Parent category ID (None for root categories).
    pub parent_id: Option<CategoryId>,
    /// Category name.
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    /// Category description.
    pub description: String,
    /// Category image URL.
    pub image_url: Option<String>,
    /// Inactive categories are hidden from listings.
    pub is_active: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Category {
    /// Create a new root category.
    pub fn new_root(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = current_timestamp();
        Self {
            id: CategoryId::generate(),
            parent_id: None,
            slug: slugify(&name),
            name,
            description: String::new(),
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new child category.
    pub fn new_child(parent: &Category, name: impl Into<String>) -> Self {
        let mut category = Self::new_root(name);
        category.parent_id = Some(parent.id.clone());
        category
    }

    /// Check if this is a root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
