//! Product attributes such as Color, Size or Weight.

use crate::error::CommerceError;
use crate::ids::{AttributeId, ProductId};
use serde::{Deserialize, Serialize};

/// A named attribute value on a product. `(product_id, name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductAttribute {
    pub id: AttributeId,
    pub product_id: ProductId,
    /// e.g. "Color"
    pub name: String,
    /// e.g. "Red"
    pub value: String,
}

impl ProductAttribute {
    /// Create an attribute, rejecting blank names.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, CommerceError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CommerceError::validation("attribute name is required"));
        }
        Ok(Self {
            id: AttributeId::generate(),
            product_id,
            name,
            value: value.into(),
        })
    }
}
