//! Products, categories and brands.

use crate::rows::{self, BRAND_COLUMNS, CATEGORY_COLUMNS, PRODUCT_COLUMNS};
use crate::{Db, DbError};
use async_trait::async_trait;
use shop_commerce::catalog::{Brand, Category, Product, ProductPatch};
use shop_commerce::search::{Pagination, ProductFilter, ProductQuery, SearchResults, SortOption};
use shop_commerce::store::{CatalogRepository, StoreResult};
use shop_commerce::{current_timestamp, BrandId, CategoryId, CommerceError, ProductId};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

/// Columns the free-text filter searches.
const TEXT_COLUMNS: [&str; 5] = [
    "name",
    "description",
    "short_description",
    "(SELECT c.name FROM categories c WHERE c.id = products.category_id)",
    "(SELECT b.name FROM brands b WHERE b.id = products.brand_id)",
];

/// `ORDER BY` for a sort option. Ties keep insertion order.
fn order_by(sort: SortOption) -> &'static str {
    match sort {
        SortOption::PriceAsc => "price_cents ASC, rowid ASC",
        SortOption::PriceDesc => "price_cents DESC, rowid ASC",
        SortOption::NameAsc => "name ASC, rowid ASC",
        SortOption::NameDesc => "name DESC, rowid ASC",
        SortOption::Oldest => "created_at ASC, rowid ASC",
        SortOption::Newest => "created_at DESC, rowid ASC",
        SortOption::RatingAsc => "rating_average ASC, rowid ASC",
        SortOption::RatingDesc => "rating_average DESC, rowid ASC",
    }
}

/// Append the `WHERE` clause for `filter`.
fn push_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProductFilter) {
    qb.push(" WHERE 1 = 1");
    if !filter.include_inactive {
        qb.push(" AND is_active = 1");
    }
    push_in(qb, "category_id", &filter.category_ids);
    push_in(qb, "brand_id", &filter.brand_ids);
    push_in(qb, "sku", &filter.skus);

    if let Some(min) = filter.min_price {
        qb.push(" AND price_cents >= ").push_bind(min.amount_cents);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price_cents <= ").push_bind(max.amount_cents);
    }
    if let Some(status) = filter.stock_status {
        let (min, max) = status.stock_range();
        push_range(qb, "stock", min, max);
    }
    push_range(qb, "stock", filter.min_stock, filter.max_stock);
    if let Some(rating) = filter.min_rating {
        qb.push(" AND rating_average >= ").push_bind(rating);
    }
    if filter.on_sale {
        qb.push(" AND original_price_cents > price_cents");
    }
    if filter.featured {
        qb.push(" AND is_featured = 1");
    }
    if filter.trending {
        qb.push(" AND is_trending = 1");
    }
    if let Some(text) = &filter.text {
        // lower() folds ASCII only.
        let needle = text.to_lowercase();
        qb.push(" AND (");
        let mut any = qb.separated(" OR ");
        for column in TEXT_COLUMNS {
            any.push(format!("instr(lower({}), ", column))
                .push_bind_unseparated(needle.clone())
                .push_unseparated(") > 0");
        }
        any.push_unseparated(")");
    }
}

fn push_in<'a, T: AsRef<str>>(qb: &mut QueryBuilder<'a, Sqlite>, column: &str, values: &'a [T]) {
    if values.is_empty() {
        return;
    }
    qb.push(" AND ").push(column).push(" IN (");
    let mut list = qb.separated(", ");
    for value in values {
        list.push_bind(value.as_ref());
    }
    list.push_unseparated(")");
}

fn push_range(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, min: Option<i64>, max: Option<i64>) {
    if let Some(min) = min {
        qb.push(" AND ").push(column).push(" >= ").push_bind(min);
    }
    if let Some(max) = max {
        qb.push(" AND ").push(column).push(" <= ").push_bind(max);
    }
}

/// Append `SET` assignments for exactly the fields the patch carries, plus
/// `updated_at`.
fn push_assignments<'a>(qb: &mut QueryBuilder<'a, Sqlite>, patch: &'a ProductPatch, now: i64) {
    let mut set = qb.separated(", ");
    if let Some(name) = &patch.name {
        set.push("name = ").push_bind_unseparated(name.as_str());
    }
    if let Some(slug) = &patch.slug {
        set.push("slug = ").push_bind_unseparated(slug.as_str());
    }
    if let Some(description) = &patch.description {
        set.push("description = ").push_bind_unseparated(description.as_str());
    }
    if let Some(short) = &patch.short_description {
        set.push("short_description = ").push_bind_unseparated(short.as_str());
    }
    if let Some(price) = patch.price {
        set.push("price_cents = ").push_bind_unseparated(price.amount_cents);
        set.push("currency = ").push_bind_unseparated(price.currency.code());
    }
    if let Some(original) = patch.original_price {
        set.push("original_price_cents = ")
            .push_bind_unseparated(original.map(|m| m.amount_cents));
    }
    if let Some(category_id) = &patch.category_id {
        set.push("category_id = ").push_bind_unseparated(category_id.as_str());
    }
    if let Some(brand_id) = &patch.brand_id {
        set.push("brand_id = ")
            .push_bind_unseparated(brand_id.as_ref().map(|b| b.as_str()));
    }
    if let Some(stock) = patch.stock {
        set.push("stock = ").push_bind_unseparated(stock);
    }
    if let Some(sku) = &patch.sku {
        set.push("sku = ").push_bind_unseparated(sku.as_str());
    }
    if let Some(meta_title) = &patch.meta_title {
        set.push("meta_title = ").push_bind_unseparated(meta_title.as_str());
    }
    if let Some(meta_description) = &patch.meta_description {
        set.push("meta_description = ").push_bind_unseparated(meta_description.as_str());
    }
    if let Some(v) = patch.is_active {
        set.push("is_active = ").push_bind_unseparated(v);
    }
    if let Some(v) = patch.is_featured {
        set.push("is_featured = ").push_bind_unseparated(v);
    }
    if let Some(v) = patch.is_trending {
        set.push("is_trending = ").push_bind_unseparated(v);
    }
    set.push("updated_at = ").push_bind_unseparated(now);
}

impl Db {
    async fn fetch_product(&self, column: &str, value: &str) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE {} = ?", PRODUCT_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::product).transpose()?)
    }

    async fn slug_exists(&self, table: &str, slug: &str) -> StoreResult<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE slug = ?)", table);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(slug)
            .fetch_one(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(exists)
    }
}

#[async_trait]
impl CatalogRepository for Db {
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        sqlx::query(
            "INSERT INTO products (id, name, slug, description, short_description, price_cents, \
             original_price_cents, currency, category_id, brand_id, stock, sku, meta_title, \
             meta_description, is_active, is_featured, is_trending, view_count, purchase_count, \
             rating_average, rating_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price().amount_cents)
        .bind(product.original_price().map(|m| m.amount_cents))
        .bind(product.price().currency.code())
        .bind(product.category_id.as_str())
        .bind(product.brand_id.as_ref().map(|b| b.as_str()))
        .bind(product.stock())
        .bind(&product.sku)
        .bind(&product.meta_title)
        .bind(&product.meta_description)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(product.is_trending)
        .bind(product.view_count)
        .bind(product.purchase_count)
        .bind(product.rating_average)
        .bind(product.rating_count)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            DbError::on_write(e, "product", &[("sku", &product.sku), ("slug", &product.slug)])
        })?;
        debug!(product_id = %product.id, "product inserted");
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> StoreResult<Option<Product>> {
        patch.validate()?;
        let mut qb = QueryBuilder::new("UPDATE products SET ");
        push_assignments(&mut qb, patch, current_timestamp());
        qb.push(" WHERE id = ").push_bind(id.as_str());
        qb.push(" RETURNING ").push(PRODUCT_COLUMNS);

        let keys = [
            ("sku", patch.sku.as_deref().unwrap_or_default()),
            ("slug", patch.slug.as_deref().unwrap_or_default()),
        ];
        let row = qb
            .build()
            .fetch_optional(self.pool())
            .await
            .map_err(|e| DbError::on_write(e, "product", &keys))?;
        Ok(row.as_ref().map(rows::product).transpose()?)
    }

    async fn get_product(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        self.fetch_product("id", id.as_str()).await
    }

    async fn find_product_by_slug(&self, slug: &str) -> StoreResult<Option<Product>> {
        self.fetch_product("slug", slug).await
    }

    async fn product_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        self.slug_exists("products", slug).await
    }

    async fn select_products(
        &self,
        filter: &ProductFilter,
        sort: SortOption,
    ) -> StoreResult<Vec<Product>> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY ").push(order_by(sort));
        let rows = qb.build().fetch_all(self.pool()).await.map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::product)?)
    }

    async fn page_products(&self, query: &ProductQuery) -> StoreResult<SearchResults<Product>> {
        // One read transaction so the count and the page agree.
        let mut tx = self.pool().begin().await.map_err(DbError::from)?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filter(&mut count, &query.filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        let pagination = Pagination::new(query.page, query.page_size, total);

        let mut select = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
        push_filter(&mut select, &query.filter);
        select
            .push(" ORDER BY ")
            .push(order_by(query.sort))
            .push(" LIMIT ")
            .push_bind(pagination.page_size)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let rows = select.build().fetch_all(&mut *tx).await.map_err(DbError::from)?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(SearchResults::new(rows::all(&rows, rows::product)?, pagination))
    }

    async fn update_products(&self, ids: &[ProductId], patch: &ProductPatch) -> StoreResult<u64> {
        patch.validate()?;
        if patch.sku.is_some() || patch.slug.is_some() {
            return Err(CommerceError::validation("sku and slug cannot be set in bulk"));
        }
        if ids.is_empty() {
            return Ok(0);
        }

        // A single statement: a failing row aborts every row.
        let mut qb = QueryBuilder::new("UPDATE products SET ");
        push_assignments(&mut qb, patch, current_timestamp());
        qb.push(" WHERE id IN (");
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(id.as_str());
        }
        list.push_unseparated(")");

        let updated = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(|e| DbError::on_write(e, "product", &[]))?
            .rows_affected();
        debug!(updated, "products patched");
        Ok(updated)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        sqlx::query(
            "INSERT INTO categories (id, parent_id, name, slug, description, image_url, is_active, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(category.id.as_str())
        .bind(category.parent_id.as_ref().map(|p| p.as_str()))
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| DbError::on_write(e, "category", &[("slug", &category.slug)]))?;
        Ok(category)
    }

    async fn get_category(&self, id: &CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query(&format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::category).transpose()?)
    }

    async fn find_category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query(&format!("SELECT {} FROM categories WHERE slug = ?", CATEGORY_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::category).transpose()?)
    }

    async fn category_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        self.slug_exists("categories", slug).await
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories ORDER BY name, rowid",
            CATEGORY_COLUMNS
        ))
        .fetch_all(self.pool())
        .await
        .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::category)?)
    }

    async fn insert_brand(&self, brand: Brand) -> StoreResult<Brand> {
        sqlx::query(
            "INSERT INTO brands (id, name, slug, description, logo_url, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(brand.id.as_str())
        .bind(&brand.name)
        .bind(&brand.slug)
        .bind(&brand.description)
        .bind(&brand.logo_url)
        .bind(brand.is_active)
        .bind(brand.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| DbError::on_write(e, "brand", &[("slug", &brand.slug)]))?;
        Ok(brand)
    }

    async fn get_brand(&self, id: &BrandId) -> StoreResult<Option<Brand>> {
        let row = sqlx::query(&format!("SELECT {} FROM brands WHERE id = ?", BRAND_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::brand).transpose()?)
    }

    async fn find_brand_by_slug(&self, slug: &str) -> StoreResult<Option<Brand>> {
        let row = sqlx::query(&format!("SELECT {} FROM brands WHERE slug = ?", BRAND_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(row.as_ref().map(rows::brand).transpose()?)
    }

    async fn brand_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        self.slug_exists("brands", slug).await
    }

    async fn list_brands(&self) -> StoreResult<Vec<Brand>> {
        let rows = sqlx::query(&format!("SELECT {} FROM brands ORDER BY name, rowid", BRAND_COLUMNS))
            .fetch_all(self.pool())
            .await
            .map_err(DbError::from)?;
        Ok(rows::all(&rows, rows::brand)?)
    }
}
