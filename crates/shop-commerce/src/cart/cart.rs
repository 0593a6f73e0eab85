//! Cart and cart item types.

use crate::current_timestamp;
use crate::error::CommerceError;
use crate::ids::{CartId, CartItemId, ProductId, SessionKey, UserId};
use serde::{Deserialize, Serialize};

/// Who a cart belongs to. A cart has exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwner {
    /// An authenticated user.
    User(UserId),
    /// An anonymous session.
    Session(SessionKey),
}

impl CartOwner {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            CartOwner::User(id) => Some(id),
            CartOwner::Session(_) => None,
        }
    }

    pub fn session_key(&self) -> Option<&SessionKey> {
        match self {
            CartOwner::User(_) => None,
            CartOwner::Session(key) => Some(key),
        }
    }
}

/// A shopping cart. Items are stored separately, keyed by cart id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// The user or session owning this cart.
    pub owner: CartOwner,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Cart {
    /// Create a new empty cart.
    pub fn new(owner: CartOwner) -> Self {
        let now = current_timestamp();
        Self {
            id: CartId::generate(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A line in a cart. `(cart_id, product_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    /// Unique item identifier.
    pub id: CartItemId,
    /// Owning cart.
    pub cart_id: CartId,
    /// Product in this line.
    pub product_id: ProductId,
    /// Units, always at least 1.
    pub quantity: i64,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl CartItem {
    /// Create a new line with the given quantity.
    pub fn new(
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Self, CommerceError> {
        validate_quantity(quantity)?;
        let now = current_timestamp();
        Ok(Self {
            id: CartItemId::generate(),
            cart_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Reject quantities below 1.
pub fn validate_quantity(quantity: i64) -> Result<(), CommerceError> {
    if quantity < 1 {
        return Err(CommerceError::InvalidQuantity(format!(
            "quantity must be at least 1, got {}",
            quantity
        )));
    }
    Ok(())
}

/// Read a quantity from a request body value.
///
/// Absent or `null` means 1. Accepts integers, floats with no fractional
/// part, and strings holding an integer.
pub fn parse_quantity(value: Option<&serde_json::Value>) -> Result<i64, CommerceError> {
    use serde_json::Value;

    let quantity = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(q) => q,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                _ => {
                    return Err(CommerceError::InvalidQuantity(format!(
                        "not an integer: {}",
                        n
                    )))
                }
            },
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            CommerceError::InvalidQuantity(format!("not an integer: {:?}", s))
        })?,
        Some(other) => {
            return Err(CommerceError::InvalidQuantity(format!(
                "not an integer: {}",
                other
            )))
        }
    };
    validate_quantity(quantity)?;
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_owner_accessors() {
        let user = CartOwner::User(UserId::new("u1"));
        assert_eq!(user.user_id(), Some(&UserId::new("u1")));
        assert!(user.session_key().is_none());

        let session = CartOwner::Session(SessionKey::new("sess_abc"));
        assert!(session.user_id().is_none());
        assert_eq!(session.session_key().map(|k| k.as_str()), Some("sess_abc"));
    }

    #[test]
    fn test_new_item_requires_positive_quantity() {
        let item = CartItem::new(CartId::new("c1"), ProductId::new("p1"), 2).unwrap();
        assert_eq!(item.quantity, 2);
        assert!(CartItem::new(CartId::new("c1"), ProductId::new("p1"), 0).is_err());
        assert!(validate_quantity(i64::MAX).is_ok());
        assert!(matches!(validate_quantity(-1), Err(CommerceError::InvalidQuantity(_))));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None).unwrap(), 1);
        assert_eq!(parse_quantity(Some(&json!(null))).unwrap(), 1);
        assert_eq!(parse_quantity(Some(&json!(3))).unwrap(), 3);
        assert_eq!(parse_quantity(Some(&json!("4"))).unwrap(), 4);
        assert_eq!(parse_quantity(Some(&json!(2.0))).unwrap(), 2);
    }

    #[test]
    fn test_parse_quantity_rejects() {
        assert!(parse_quantity(Some(&json!("two"))).is_err());
        assert!(parse_quantity(Some(&json!(2.5))).is_err());
        assert!(parse_quantity(Some(&json!(0))).is_err());
        assert!(parse_quantity(Some(&json!(-3))).is_err());
        assert!(parse_quantity(Some(&json!([1]))).is_err());
        assert!(parse_quantity(Some(&json!(true))).is_err());
    }
}
