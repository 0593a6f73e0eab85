//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in catalog and cart operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Product not found (or not visible to the caller).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Brand not found.
    #[error("Brand not found: {0}")]
    BrandNotFound(String),

    /// Item not in the caller's cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Image not found on the product.
    #[error("Image not found")]
    ImageNotFound(String),

    /// Product has no primary image.
    #[error("No primary image found")]
    NoPrimaryImage(String),

    /// Attribute not found.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// Review not found, or not owned by the caller.
    #[error("Review not found: {0}")]
    ReviewNotFound(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in quantity or money calculation")]
    Overflow,

    /// Validation error.
    #[error("{0}")]
    Validation(String),

    /// The action requires an authenticated user.
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Storage error.
    #[error("Database error: {0}")]
    Database(String),
}

impl CommerceError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        CommerceError::Validation(msg.into())
    }

    /// Check if this error means a referenced record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CommerceError::ProductNotFound(_)
                | CommerceError::CategoryNotFound(_)
                | CommerceError::BrandNotFound(_)
                | CommerceError::ItemNotInCart(_)
                | CommerceError::ImageNotFound(_)
                | CommerceError::NoPrimaryImage(_)
                | CommerceError::AttributeNotFound(_)
                | CommerceError::ReviewNotFound(_)
        )
    }

    /// Check if this error is the caller's fault (bad input).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommerceError::Validation(_)
                | CommerceError::InvalidQuantity(_)
                | CommerceError::Overflow
        )
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(CommerceError::ProductNotFound("p1".into()).is_not_found());
        assert!(CommerceError::ItemNotInCart("i1".into()).is_not_found());
        assert!(!CommerceError::Overflow.is_not_found());

        assert!(CommerceError::validation("bad").is_validation());
        assert!(CommerceError::InvalidQuantity("x".into()).is_validation());
        assert!(!CommerceError::Database("down".into()).is_validation());
    }

    #[test]
    fn test_primary_image_message() {
        let err = CommerceError::NoPrimaryImage("p1".into());
        assert_eq!(err.to_string(), "No primary image found");
    }
}
