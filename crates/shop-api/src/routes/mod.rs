pub mod cart;
pub mod catalog;
pub mod health;
pub mod media;
pub mod products;
pub mod reviews;
