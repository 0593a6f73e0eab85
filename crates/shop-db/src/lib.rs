//! SQLite store for the shop backend.
//!
//! [`Db`] wraps an `sqlx` connection pool and implements all of the
//! repository traits from `shop_commerce::store`. Uniqueness, foreign keys
//! and quantity bounds are table constraints; multi-statement operations run
//! in a transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_db::Db;
//! use std::sync::Arc;
//!
//! let db = Arc::new(Db::connect("sqlite://shop.db").await?);
//! let carts = CartService::new(db.clone(), db.clone(), db.clone());
//! ```

mod analytics;
mod carts;
mod catalog;
mod db;
mod error;
mod media;
mod reviews;
mod rows;

pub use db::{Db, DEFAULT_MAX_CONNECTIONS};
pub use error::DbError;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Db, DbError};
}
