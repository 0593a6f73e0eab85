//! Product images and attributes.

use crate::rows::{self, ATTRIBUTE_COLUMNS, IMAGE_COLUMNS};
use crate::{Db, DbError};
use async_trait::async_trait;
use shop_commerce::catalog::{ProductAttribute, ProductImage};
use shop_commerce::store::{MediaRepository, StoreResult};
use shop_commerce::{AttributeId, ImageId, ProductId};
use sqlx::QueryBuilder;
use std::collections::HashMap;
use tracing::debug;

#[async_trait]
impl MediaRepository for Db {
    async fn insert_image(&self, image: ProductImage) -> StoreResult<ProductImage> {
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        if image.is_primary {
            sqlx::query("UPDATE product_images SET is_primary = 0 WHERE product_id = ?")
                .bind(image.product_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
        }
        sqlx::query(
            "INSERT INTO product_images (id, product_id, url, alt_text, is_primary, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(image.id.as_str())
        .bind(image.product_id.as_str())
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(image.is_primary)
        .bind(image.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::on_write(e, "image", &[]))?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(image)
    }

    async fn list_images(&self, product_id: &ProductId) -> StoreResult<Vec<ProductImage>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_images WHERE product_id = ? ORDER BY rowid",
            IMAGE_COLUMNS
        ))
        .bind(product_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::image)?)
    }

    async fn images_for(
        &self,
        product_ids: &[ProductId],
    ) -> StoreResult<HashMap<ProductId, Vec<ProductImage>>> {
        let mut by_product: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        if product_ids.is_empty() {
            return Ok(by_product);
        }

        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM product_images WHERE product_id IN (",
            IMAGE_COLUMNS
        ));
        let mut list = qb.separated(", ");
        for id in product_ids {
            list.push_bind(id.as_str());
        }
        list.push_unseparated(") ORDER BY rowid");

        let rows = qb.build().fetch_all(self.pool()).await.map_err(DbError::from)?;
        for image in rows::all(&rows, rows::image)? {
            by_product.entry(image.product_id.clone()).or_default().push(image);
        }
        Ok(by_product)
    }

    async fn delete_image(&self, id: &ImageId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM product_images WHERE id = ?")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_primary_image(
        &self,
        product_id: &ProductId,
        image_id: &ImageId,
    ) -> StoreResult<Option<ProductImage>> {
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;
        let changed = sqlx::query(
            "UPDATE product_images SET is_primary = (id = ?1) \
             WHERE product_id = ?2 \
             AND EXISTS (SELECT 1 FROM product_images WHERE id = ?1 AND product_id = ?2)",
        )
        .bind(image_id.as_str())
        .bind(product_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?
        .rows_affected();
        if changed == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!("SELECT {} FROM product_images WHERE id = ?", IMAGE_COLUMNS))
            .bind(image_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        tx.commit().await.map_err(DbError::from)?;
        debug!(product_id = %product_id, image_id = %image_id, "primary image set");
        Ok(Some(rows::image(&row)?))
    }

    async fn upsert_attribute(&self, attribute: ProductAttribute) -> StoreResult<ProductAttribute> {
        let row = sqlx::query(&format!(
            "INSERT INTO product_attributes (id, product_id, name, value) VALUES (?, ?, ?, ?) \
             ON CONFLICT (product_id, name) DO UPDATE SET value = excluded.value \
             RETURNING {}",
            ATTRIBUTE_COLUMNS
        ))
        .bind(attribute.id.as_str())
        .bind(attribute.product_id.as_str())
        .bind(&attribute.name)
        .bind(&attribute.value)
        .fetch_one(self.pool())
        .await
        .map_err(|e| DbError::on_write(e, "attribute", &[]))?;
        Ok(rows::attribute(&row)?)
    }

    async fn list_attributes(&self, product_id: &ProductId) -> StoreResult<Vec<ProductAttribute>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_attributes WHERE product_id = ? ORDER BY rowid",
            ATTRIBUTE_COLUMNS
        ))
        .bind(product_id.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::attribute)?)
    }

    async fn delete_attribute(&self, id: &AttributeId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM product_attributes WHERE id = ?")
            .bind(id.as_str())
            .execute(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{category, db, product};

    #[tokio::test]
    async fn test_set_primary_clears_others() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let mut first = ProductImage::new(lamp.id.clone(), "/a.jpg");
        first.is_primary = true;
        let first = db.insert_image(first).await.unwrap();
        let second = db
            .insert_image(ProductImage::new(lamp.id.clone(), "/b.jpg"))
            .await
            .unwrap();

        let primary = db.set_primary_image(&lamp.id, &second.id).await.unwrap().unwrap();
        assert!(primary.is_primary);
        let images = db.list_images(&lamp.id).await.unwrap();
        assert_eq!(images[0].id, first.id);
        assert!(!images[0].is_primary);
        assert!(images[1].is_primary);
    }

    #[tokio::test]
    async fn test_inserting_primary_demotes_existing() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        for url in ["/a.jpg", "/b.jpg"] {
            let mut image = ProductImage::new(lamp.id.clone(), url);
            image.is_primary = true;
            db.insert_image(image).await.unwrap();
        }
        let primaries: Vec<_> = db
            .list_images(&lamp.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|i| i.is_primary)
            .map(|i| i.url)
            .collect();
        assert_eq!(primaries, ["/b.jpg"]);
    }

    #[tokio::test]
    async fn test_set_primary_foreign_image_changes_nothing() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let chair = product(&db, &general, "Chair", "SKU-2").await;
        let mut own = ProductImage::new(lamp.id.clone(), "/a.jpg");
        own.is_primary = true;
        db.insert_image(own).await.unwrap();
        let other = db
            .insert_image(ProductImage::new(chair.id.clone(), "/c.jpg"))
            .await
            .unwrap();

        assert!(db.set_primary_image(&lamp.id, &other.id).await.unwrap().is_none());
        assert!(db.list_images(&lamp.id).await.unwrap()[0].is_primary);
        assert!(db
            .set_primary_image(&lamp.id, &ImageId::new("ghost"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_images_for_groups_by_product() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let chair = product(&db, &general, "Chair", "SKU-2").await;
        for (id, url) in [(&lamp.id, "/a.jpg"), (&chair.id, "/c.jpg"), (&lamp.id, "/b.jpg")] {
            db.insert_image(ProductImage::new(id.clone(), url)).await.unwrap();
        }

        let grouped = db.images_for(&[lamp.id.clone(), chair.id.clone()]).await.unwrap();
        let lamp_urls: Vec<_> = grouped[&lamp.id].iter().map(|i| i.url.as_str()).collect();
        assert_eq!(lamp_urls, ["/a.jpg", "/b.jpg"]);
        assert_eq!(grouped[&chair.id].len(), 1);
        assert!(db.images_for(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_image() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let image = db
            .insert_image(ProductImage::new(lamp.id.clone(), "/a.jpg"))
            .await
            .unwrap();
        assert!(db.delete_image(&image.id).await.unwrap());
        assert!(!db.delete_image(&image.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_attribute_upsert_by_name() {
        let db = db().await;
        let general = category(&db, "General").await;
        let lamp = product(&db, &general, "Lamp", "SKU-1").await;
        let first = db
            .upsert_attribute(ProductAttribute::new(lamp.id.clone(), "Color", "Red").unwrap())
            .await
            .unwrap();
        let second = db
            .upsert_attribute(ProductAttribute::new(lamp.id.clone(), "Color", "Blue").unwrap())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.value, "Blue");

        let attributes = db.list_attributes(&lamp.id).await.unwrap();
        assert_eq!(attributes, [second.clone()]);
        assert!(db.delete_attribute(&second.id).await.unwrap());
        assert!(db.list_attributes(&lamp.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_for_missing_product_rejected() {
        let db = db().await;
        let image = ProductImage::new(ProductId::new("ghost"), "/a.jpg");
        assert!(db.insert_image(image).await.unwrap_err().is_validation());
    }
}
