//! Cart resolution and item merging.

use crate::cart::{validate_quantity, Cart, CartItem, CartOwner};
use crate::catalog::{display_image, Product};
use crate::error::CommerceError;
use crate::ids::{CartItemId, ProductId, SessionKey, UserId};
use crate::money::{Currency, Money};
use crate::store::{CartRepository, CatalogRepository, MediaRepository, StoreResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity a request arrives with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartIdentity {
    pub user_id: Option<UserId>,
    pub session_key: Option<SessionKey>,
}

impl CartIdentity {
    /// Pick the cart owner. A user id wins over a session key; with neither,
    /// a fresh session key is allocated and returned alongside.
    pub fn owner(&self) -> (CartOwner, Option<SessionKey>) {
        if let Some(user_id) = &self.user_id {
            return (CartOwner::User(user_id.clone()), None);
        }
        match &self.session_key {
            Some(key) => (CartOwner::Session(key.clone()), None),
            None => {
                let key = SessionKey::generate();
                (CartOwner::Session(key.clone()), Some(key))
            }
        }
    }

    /// The owner this identity already names, without allocating a session.
    pub fn existing_owner(&self) -> Option<CartOwner> {
        match (&self.user_id, &self.session_key) {
            (Some(user_id), _) => Some(CartOwner::User(user_id.clone())),
            (None, Some(key)) => Some(CartOwner::Session(key.clone())),
            (None, None) => None,
        }
    }
}

/// The caller's cart, plus the session key allocated for it if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCart {
    pub cart: Cart,
    pub allocated_session: Option<SessionKey>,
}

/// A cart item with the product details a cart page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: CartItem,
    pub product_name: String,
    pub product_price: Money,
    /// Primary image, else the first image, else none.
    pub product_image: Option<String>,
}

impl CartLine {
    /// Price times quantity.
    pub fn line_total(&self) -> Result<Money, CommerceError> {
        self.product_price
            .try_multiply(self.item.quantity)
            .ok_or(CommerceError::Overflow)
    }
}

/// A cart with its enriched lines.
#[derive(Debug, Clone, PartialEq)]
pub struct CartDetails {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartDetails {
    /// Total units across all lines.
    pub fn item_count(&self) -> Result<i64, CommerceError> {
        self.lines.iter().try_fold(0i64, |acc, line| {
            acc.checked_add(line.item.quantity).ok_or(CommerceError::Overflow)
        })
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        let currency = self
            .lines
            .first()
            .map(|l| l.product_price.currency)
            .unwrap_or(Currency::USD);
        self.lines.iter().try_fold(Money::zero(currency), |acc, line| {
            acc.try_add(&line.line_total()?).ok_or(CommerceError::Overflow)
        })
    }
}

/// Cart operations.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn CatalogRepository>,
    media: Arc<dyn MediaRepository>,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn CatalogRepository>,
        media: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            carts,
            catalog,
            media,
        }
    }

    /// Find or create the cart for this identity.
    pub async fn resolve(&self, identity: &CartIdentity) -> StoreResult<ResolvedCart> {
        let (owner, allocated_session) = identity.owner();
        let cart = self.carts.find_or_create_cart(&owner).await?;
        if allocated_session.is_some() {
            debug!(cart_id = %cart.id, "allocated session for anonymous cart");
        }
        Ok(ResolvedCart {
            cart,
            allocated_session,
        })
    }

    /// The identity's existing cart, if it has one. Never creates a cart.
    pub async fn find(&self, identity: &CartIdentity) -> StoreResult<Option<Cart>> {
        match identity.existing_owner() {
            Some(owner) => self.carts.find_cart(&owner).await,
            None => Ok(None),
        }
    }

    /// The cart with every item enriched.
    pub async fn details(&self, cart: &Cart) -> StoreResult<CartDetails> {
        let items = self.carts.cart_items(&cart.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            match self.catalog.get_product(&item.product_id).await? {
                Some(product) => lines.push(self.line(item, &product).await?),
                None => warn!(item_id = %item.id, product_id = %item.product_id, "cart item references missing product"),
            }
        }
        Ok(CartDetails {
            cart: cart.clone(),
            lines,
        })
    }

    /// Add a product to the identity's cart. The product is checked before
    /// the cart is resolved, so a rejected add never creates a cart.
    pub async fn add_to_cart(
        &self,
        identity: &CartIdentity,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<(ResolvedCart, CartLine)> {
        validate_quantity(quantity)?;
        let product = self.active_product(product_id).await?;
        let resolved = self.resolve(identity).await?;
        let line = self.add_product(&resolved.cart, &product, quantity).await?;
        Ok((resolved, line))
    }

    /// Add a product. An existing line for the product has `quantity` added
    /// to it; otherwise a line is created with exactly `quantity`.
    pub async fn add_item(
        &self,
        cart: &Cart,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<CartLine> {
        let product = self.active_product(product_id).await?;
        self.add_product(cart, &product, quantity).await
    }

    async fn add_product(&self, cart: &Cart, product: &Product, quantity: i64) -> StoreResult<CartLine> {
        let item = self
            .carts
            .add_or_increment(&cart.id, &product.id, quantity)
            .await?;
        info!(cart_id = %cart.id, product_id = %product.id, quantity = item.quantity, "item added to cart");
        self.line(item, product).await
    }

    async fn active_product(&self, product_id: &ProductId) -> StoreResult<Product> {
        match self.catalog.get_product(product_id).await? {
            Some(p) if p.is_active => Ok(p),
            _ => Err(CommerceError::ProductNotFound(product_id.to_string())),
        }
    }

    /// Set an item's quantity outright.
    pub async fn update_item(
        &self,
        cart: &Cart,
        item_id: &CartItemId,
        quantity: i64,
    ) -> StoreResult<CartLine> {
        let item = self
            .carts
            .set_item_quantity(&cart.id, item_id, quantity)
            .await?
            .ok_or_else(|| CommerceError::ItemNotInCart(item_id.to_string()))?;
        let product = self
            .catalog
            .get_product(&item.product_id)
            .await?
            .ok_or_else(|| CommerceError::ProductNotFound(item.product_id.to_string()))?;
        debug!(cart_id = %cart.id, item_id = %item_id, quantity, "cart item updated");
        self.line(item, &product).await
    }

    pub async fn remove_item(&self, cart: &Cart, item_id: &CartItemId) -> StoreResult<()> {
        if !self.carts.remove_item(&cart.id, item_id).await? {
            return Err(CommerceError::ItemNotInCart(item_id.to_string()));
        }
        debug!(cart_id = %cart.id, item_id = %item_id, "cart item removed");
        Ok(())
    }

    /// Remove every item. Clearing an empty cart is fine.
    pub async fn clear(&self, cart: &Cart) -> StoreResult<()> {
        let removed = self.carts.clear_cart(&cart.id).await?;
        debug!(cart_id = %cart.id, removed, "cart cleared");
        Ok(())
    }

    async fn line(&self, item: CartItem, product: &Product) -> StoreResult<CartLine> {
        let images = self.media.list_images(&product.id).await?;
        Ok(CartLine {
            product_image: display_image(&images).map(|i| i.url.clone()),
            product_name: product.name.clone(),
            product_price: product.price(),
            item,
        })
    }
}
