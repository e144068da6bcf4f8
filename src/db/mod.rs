//! Database access layer

pub mod product_image_repo;
pub mod product_repo;
pub mod store;

pub use store::{PgProductStore, ProductStore};
