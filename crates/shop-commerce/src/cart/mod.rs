//! Shopping cart module.
//!
//! Contains the cart and item types, cart ownership, and the service that
//! resolves a request to its cart and merges items into it.

mod cart;
mod service;

pub use cart::{parse_quantity, validate_quantity, Cart, CartItem, CartOwner};
pub use service::{CartDetails, CartIdentity, CartLine, CartService, ResolvedCart};
