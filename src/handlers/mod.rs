//! HTTP handlers

mod health;
mod products;
mod uploads;

pub use health::{health, live, ready};
pub use products::{
    bulk_create_products, create_product, delete_product, get_product, list_product_images,
    list_products, update_product,
};
pub use uploads::presigned_url;
