//! Product catalog module.
//!
//! Contains products, categories, brands, images and attributes, plus the
//! catalog service that ties them to storage.

mod attribute;
mod brand;
mod category;
mod media;
mod product;
mod service;
pub mod slug;

pub use attribute::ProductAttribute;
pub use brand::Brand;
pub use category::Category;
pub use media::{display_image, ProductImage};
pub use product::{round2, Product, ProductPatch, StockStatus, LIMITED_STOCK_THRESHOLD};
pub use service::{
    parse_stock, BulkUpdate, CatalogService, NewBrand, NewCategory, NewProduct, ProductUpdate,
};
