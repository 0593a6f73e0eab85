//! Brand type.

use crate::catalog::slug::slugify;
use crate::current_timestamp;
use crate::ids::BrandId;
use serde::{Deserialize, Serialize};

/// A product brand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    /// URL-friendly slug (unique).
    pub slug: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub is_active: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl Brand {
    /// Create a new active brand.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: BrandId::generate(),
            slug: slugify(&name),
            name,
            description: String::new(),
            logo_url: None,
            is_active: true,
            created_at: current_timestamp(),
        }
    }
}
