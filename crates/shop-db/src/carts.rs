//! Carts and cart lines.

use crate::rows::{self, CART_COLUMNS, CART_ITEM_COLUMNS};
use crate::{Db, DbError};
use async_trait::async_trait;
use shop_commerce::cart::{validate_quantity, Cart, CartItem, CartOwner};
use shop_commerce::store::{CartRepository, StoreResult};
use shop_commerce::{current_timestamp, CartId, CartItemId, CommerceError, ProductId};
use sqlx::sqlite::SqliteConnection;
use tracing::info;

/// Owner column and key for a cart lookup.
fn owner_key(owner: &CartOwner) -> (&'static str, &str) {
    match owner {
        CartOwner::User(id) => ("user_id", id.as_str()),
        CartOwner::Session(key) => ("session_key", key.as_str()),
    }
}

async fn touch_cart(conn: &mut SqliteConnection, cart_id: &CartId, now: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(cart_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl CartRepository for Db {
    async fn find_or_create_cart(&self, owner: &CartOwner) -> StoreResult<Cart> {
        let cart = Cart::new(owner.clone());
        let created = sqlx::query(
            "INSERT INTO carts (id, user_id, session_key, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(cart.id.as_str())
        .bind(owner.user_id().map(|u| u.as_str()))
        .bind(owner.session_key().map(|k| k.as_str()))
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(self.pool())
        .await
        .map_err(DbError::from)?
        .rows_affected();
        if created > 0 {
            info!(cart_id = %cart.id, "cart created");
        }

        self.find_cart(owner)
            .await?
            .ok_or_else(|| CommerceError::Database("cart vanished after insert".into()))
    }

    async fn find_cart(&self, owner: &CartOwner) -> StoreResult<Option<Cart>> {
        let (column, key) = owner_key(owner);
        let row = sqlx::query(&format!("SELECT {} FROM carts WHERE {} = ?", CART_COLUMNS, column))
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::cart).transpose()?)
    }

    async fn cart_items(&self, cart_id: &CartId) -> StoreResult<Vec<CartItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM cart_items WHERE cart_id = ? ORDER BY rowid",
            CART_ITEM_COLUMNS
        ))
        .bind(cart_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::cart_item)?)
    }

    async fn add_or_increment(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<CartItem> {
        let item = CartItem::new(cart_id.clone(), product_id.clone(), quantity)?;

        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        // The WHERE guard turns an overflowing sum into "no row".
        let row = sqlx::query(&format!(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT (cart_id, product_id) DO UPDATE \
             SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at \
             WHERE quantity <= 9223372036854775807 - excluded.quantity \
             RETURNING {}",
            CART_ITEM_COLUMNS
        ))
        .bind(item.id.as_str())
        .bind(cart_id.as_str())
        .bind(product_id.as_str())
        .bind(quantity)
        .bind(item.created_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DbError::on_write(e, "cart item", &[]))?;

        let Some(row) = row else {
            return Err(CommerceError::Overflow);
        };
        touch_cart(&mut *tx, cart_id, item.created_at).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(rows::cart_item(&row)?)
    }

    async fn set_item_quantity(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
        quantity: i64,
    ) -> StoreResult<Option<CartItem>> {
        validate_quantity(quantity)?;
        let now = current_timestamp();

        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        let row = sqlx::query(&format!(
            "UPDATE cart_items SET quantity = ?, updated_at = ? WHERE id = ? AND cart_id = ? \
             RETURNING {}",
            CART_ITEM_COLUMNS
        ))
        .bind(quantity)
        .bind(now)
        .bind(item_id.as_str())
        .bind(cart_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        touch_cart(&mut *tx, cart_id, now).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(Some(rows::cart_item(&row)?))
    }

    async fn remove_item(&self, cart_id: &CartId, item_id: &CartItemId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
            .bind(item_id.as_str())
            .bind(cart_id.as_str())
            .execute(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, cart_id: &CartId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id.as_str())
            .execute(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{category, db, product};
    use shop_commerce::{SessionKey, UserId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_or_create_is_stable() {
        let db = db().await;
        let owner = CartOwner::Session(SessionKey::new("s1"));
        assert!(db.find_cart(&owner).await.unwrap().is_none());

        let first = db.find_or_create_cart(&owner).await.unwrap();
        let second = db.find_or_create_cart(&owner).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.owner, owner);

        let user_cart = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();
        assert_ne!(user_cart.id, first.id);
    }

    #[tokio::test]
    async fn test_add_sets_then_increments() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let cart = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();

        let first = db.add_or_increment(&cart.id, &lamp.id, 2).await.unwrap();
        assert_eq!(first.quantity, 2);
        let second = db.add_or_increment(&cart.id, &lamp.id, 3).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(db.cart_items(&cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let cart = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();
        let err = db.add_or_increment(&cart.id, &lamp.id, 0).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidQuantity(_)));
        assert!(db.cart_items(&cart.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_lose_nothing() {
        let db = Arc::new(db().await);
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let cart = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let db = db.clone();
                let cart_id = cart.id.clone();
                let product_id = lamp.id.clone();
                tokio::spawn(async move { db.add_or_increment(&cart_id, &product_id, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let items = db.cart_items(&cart.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 50);
    }

    #[tokio::test]
    async fn test_add_overflow_leaves_line_unchanged() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let cart = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();
        db.add_or_increment(&cart.id, &lamp.id, i64::MAX - 1).await.unwrap();

        let err = db.add_or_increment(&cart.id, &lamp.id, 2).await.unwrap_err();
        assert_eq!(err, CommerceError::Overflow);
        let items = db.cart_items(&cart.id).await.unwrap();
        assert_eq!(items[0].quantity, i64::MAX - 1);

        let filled = db.add_or_increment(&cart.id, &lamp.id, 1).await.unwrap();
        assert_eq!(filled.quantity, i64::MAX);
    }

    #[tokio::test]
    async fn test_item_ops_scoped_to_cart() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let mine = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u1")))
            .await
            .unwrap();
        let theirs = db
            .find_or_create_cart(&CartOwner::User(UserId::new("u2")))
            .await
            .unwrap();
        let item = db.add_or_increment(&theirs.id, &lamp.id, 1).await.unwrap();

        assert!(db.set_item_quantity(&mine.id, &item.id, 4).await.unwrap().is_none());
        assert!(!db.remove_item(&mine.id, &item.id).await.unwrap());

        let updated = db.set_item_quantity(&theirs.id, &item.id, 4).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 4);
        assert!(db.set_item_quantity(&theirs.id, &item.id, 0).await.is_err());
        assert!(db.remove_item(&theirs.id, &item.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let chair = product(&db, &general, "Chair", "SKU-2").await;
        let cart = db
            .find_or_create_cart(&CartOwner::Session(SessionKey::new("s1")))
            .await
            .unwrap();
        db.add_or_increment(&cart.id, &lamp.id, 1).await.unwrap();
        db.add_or_increment(&cart.id, &chair.id, 1).await.unwrap();

        assert_eq!(db.clear_cart(&cart.id).await.unwrap(), 2);
        assert_eq!(db.clear_cart(&cart.id).await.unwrap(), 0);
    }
}
