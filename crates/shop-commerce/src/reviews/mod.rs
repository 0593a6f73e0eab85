//! Reviews module.
//!
//! Product reviews, rating aggregation and review statistics.

mod aggregate;
mod review;
mod service;

pub use aggregate::{RatingSummary, ReviewStats};
pub use review::{validate_rating, ProductReview, ReviewEdit, MAX_RATING, MIN_RATING};
pub use service::{NewReview, ReviewService};
