//! Product view records.

use crate::current_timestamp;
use crate::ids::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Address recorded when the client IP is unknown.
pub const DEFAULT_CLIENT_IP: &str = "127.0.0.1";

/// One recorded view. `(product_id, user_id, ip_address)` is unique, with an
/// absent user counting as its own value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductView {
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub ip_address: String,
    /// Unix timestamp of the first view.
    pub created_at: i64,
}

impl ProductView {
    /// Create a view record stamped with the current time.
    pub fn new(product_id: ProductId, user_id: Option<UserId>, ip_address: Option<&str>) -> Self {
        let ip_address = ip_address
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(DEFAULT_CLIENT_IP)
            .to_string();
        Self {
            product_id,
            user_id,
            ip_address,
            created_at: current_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ip_defaults_to_loopback() {
        let view = ProductView::new(ProductId::new("p1"), None, None);
        assert_eq!(view.ip_address, DEFAULT_CLIENT_IP);
        let view = ProductView::new(ProductId::new("p1"), None, Some("  "));
        assert_eq!(view.ip_address, DEFAULT_CLIENT_IP);
        let view = ProductView::new(ProductId::new("p1"), None, Some(" 10.0.0.1 "));
        assert_eq!(view.ip_address, "10.0.0.1");
    }
}
