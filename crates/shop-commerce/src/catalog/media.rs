//! Product images.

use crate::current_timestamp;
use crate::ids::{ImageId, ProductId};
use serde::{Deserialize, Serialize};

/// An image attached to a product.
///
/// At most one image per product has `is_primary` set; the store clears the
/// others whenever a primary is chosen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    /// URL to the image file.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: String,
    pub is_primary: bool,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl ProductImage {
    /// Create a new non-primary image.
    pub fn new(product_id: ProductId, url: impl Into<String>) -> Self {
        Self {
            id: ImageId::generate(),
            product_id,
            url: url.into(),
            alt_text: String::new(),
            is_primary: false,
            created_at: current_timestamp(),
        }
    }
}

/// Pick the image to show for a product: the primary one, else the first.
pub fn display_image(images: &[ProductImage]) -> Option<&ProductImage> {
    images
        .iter()
        .find(|i| i.is_primary)
        .or_else(|| images.first())
}
