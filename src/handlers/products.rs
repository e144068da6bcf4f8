//! Product handlers - HTTP endpoints for product operations
//!
//! Creation is the producer side of the enhancement pipeline: after a
//! product row commits with status `pending`, one queue message is enqueued
//! for it. An enqueue failure is logged and deliberately does not roll back
//! the creation; the product simply stays `pending` until reconciled.

use crate::db::{product_image_repo, product_repo};
use crate::error::{AppError, Result};
use crate::models::{
    BulkCreateRequest, CreateProductRequest, Pagination, Product, ProductStatus,
    UpdateProductRequest,
};
use crate::services::EnhancementQueue;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

const BULK_CREATE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub data: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub created: usize,
    pub failed: usize,
    pub total: usize,
    pub products: Vec<Product>,
    pub errors: Vec<BulkCreateError>,
}

/// Enqueue one enhancement message per created product. Failures are logged,
/// not propagated: the rows are already committed.
async fn enqueue_created(queue: &Arc<dyn EnhancementQueue>, products: &[Product]) {
    for product in products {
        if let Err(e) = queue.send(product.id).await {
            warn!(
                product_id = product.id,
                error = %e,
                "Failed to enqueue product for enhancement; it will stay pending"
            );
        }
    }
}

/// Create a new product
pub async fn create_product(
    pool: web::Data<PgPool>,
    queue: web::Data<Arc<dyn EnhancementQueue>>,
    req: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    req.validate().map_err(AppError::Validation)?;

    let product = product_repo::create_product(&pool, &req).await?;
    enqueue_created(&queue, std::slice::from_ref(&product)).await;

    Ok(HttpResponse::Created().json(product))
}

/// Create up to 100 products in one request
///
/// Items are validated individually; valid items commit together and invalid
/// ones are reported back with their index.
pub async fn bulk_create_products(
    pool: web::Data<PgPool>,
    queue: web::Data<Arc<dyn EnhancementQueue>>,
    req: web::Json<BulkCreateRequest>,
) -> Result<HttpResponse> {
    let total = req.products.len();
    if total == 0 {
        return Err(AppError::Validation(
            "products array cannot be empty".to_string(),
        ));
    }
    if total > BULK_CREATE_LIMIT {
        return Err(AppError::Validation(format!(
            "maximum {BULK_CREATE_LIMIT} products allowed per bulk upload"
        )));
    }

    let mut valid = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for (index, item) in req.products.iter().enumerate() {
        match item.validate() {
            Ok(()) => valid.push(item.clone()),
            Err(e) => errors.push(BulkCreateError { index, error: e }),
        }
    }

    let products = if valid.is_empty() {
        Vec::new()
    } else {
        product_repo::create_products_bulk(&pool, &valid).await?
    };
    enqueue_created(&queue, &products).await;

    let response = BulkCreateResponse {
        created: products.len(),
        failed: errors.len(),
        total,
        products,
        errors,
    };

    if response.created > 0 {
        Ok(HttpResponse::Created().json(response))
    } else {
        Ok(HttpResponse::BadRequest().json(response))
    }
}

/// List products with optional status/category filters and pagination
pub async fn list_products(
    pool: web::Data<PgPool>,
    query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    if let Some(status) = query.status.as_deref() {
        if ProductStatus::from_str(status).is_none() {
            return Err(AppError::Validation(format!("unknown status: {status}")));
        }
    }

    let total = product_repo::count_products(
        &pool,
        query.status.as_deref(),
        query.category.as_deref(),
    )
    .await?;
    let data = product_repo::list_products(
        &pool,
        query.status.as_deref(),
        query.category.as_deref(),
        per_page,
        list_offset(page, per_page),
    )
    .await?;

    Ok(HttpResponse::Ok().json(ProductListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// Row offset for a 1-based page; saturates so an absurd page number can
/// never overflow into a negative OFFSET
fn list_offset(page: i64, per_page: i64) -> i64 {
    (page - 1).saturating_mul(per_page)
}

/// Get a product by ID
pub async fn get_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
) -> Result<HttpResponse> {
    match product_repo::find_product_by_id(&pool, *product_id).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound(format!("product {product_id}"))),
    }
}

/// Partially update a product
///
/// Status changes here come from the review flow (`approved`/`rejected`);
/// the enhancement worker writes `pending_review` through its own path.
pub async fn update_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
    req: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    if let Some(status) = req.status.as_deref() {
        if ProductStatus::from_str(status).is_none() {
            return Err(AppError::Validation(format!("unknown status: {status}")));
        }
    }
    if let Some(category) = req.category.as_deref() {
        if category.trim().is_empty() {
            return Err(AppError::Validation("category must not be empty".to_string()));
        }
    }

    match product_repo::update_product(&pool, *product_id, &req).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound(format!("product {product_id}"))),
    }
}

/// Delete a product and its enhanced images
pub async fn delete_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
) -> Result<HttpResponse> {
    if product_repo::delete_product(&pool, *product_id).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(AppError::NotFound(format!("product {product_id}")))
    }
}

/// List enhanced images for a product
pub async fn list_product_images(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
) -> Result<HttpResponse> {
    if product_repo::find_product_by_id(&pool, *product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {product_id}")));
    }

    let images = product_image_repo::find_images_by_product(&pool, *product_id).await?;
    Ok(HttpResponse::Ok().json(images))
}
