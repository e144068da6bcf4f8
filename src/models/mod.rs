//! Data models for catalog-service
//!
//! - Product: a listing created by the mobile client, with commercial fields
//! - ProductImage: an AI-enhanced variant produced by the enhancement worker

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ========================================
// Product Models
// ========================================

/// Product status in the enhancement/review lifecycle
///
/// The producer creates products as `pending`; the enhancement worker is the
/// only writer of `pending_review`; `approved`/`rejected` are written by the
/// external review flow, never by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    PendingReview,
    Approved,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "pending_review" => Some(Self::PendingReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Enhanced image status in the review lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Pending,
    Approved,
    Rejected,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Product database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub category: String,
    pub raw_image: String,
    pub mrp: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub gst: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn get_status(&self) -> ProductStatus {
        ProductStatus::from_str(&self.status).unwrap_or(ProductStatus::Pending)
    }
}

/// Product image database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub image_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductImage {
    pub fn get_status(&self) -> ImageStatus {
        ImageStatus::from_str(&self.status).unwrap_or(ImageStatus::Pending)
    }
}

// ========================================
// Request / Response DTOs
// ========================================

/// Create product request DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub category: String,
    pub raw_image: String,
    pub mrp: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub gst: Decimal,
}

impl CreateProductRequest {
    /// Validate commercial fields at the HTTP boundary.
    pub fn validate(&self) -> Result<(), String> {
        if self.category.trim().is_empty() {
            return Err("category must not be empty".to_string());
        }
        if self.raw_image.trim().is_empty() {
            return Err("raw_image must not be empty".to_string());
        }
        if self.mrp <= Decimal::ZERO {
            return Err("mrp must be positive".to_string());
        }
        if self.price < Decimal::ZERO || self.discount < Decimal::ZERO || self.gst < Decimal::ZERO
        {
            return Err("price, discount and gst must not be negative".to_string());
        }
        if self.price > self.mrp {
            return Err("price must not exceed mrp".to_string());
        }
        if self.discount > self.mrp {
            return Err("discount must not exceed mrp".to_string());
        }
        Ok(())
    }
}

/// Bulk create request DTO
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateRequest {
    pub products: Vec<CreateProductRequest>,
}

/// Update product request DTO (partial update)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductRequest {
    pub category: Option<String>,
    pub mrp: Option<Decimal>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub gst: Option<Decimal>,
    /// Written by the external review flow (`approved` / `rejected`)
    pub status: Option<String>,
}

/// Pagination metadata returned by list endpoints
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateProductRequest {
        CreateProductRequest {
            category: "Electronics".to_string(),
            raw_image: "https://bucket.s3.us-east-1.amazonaws.com/products/a.jpg".to_string(),
            mrp: Decimal::new(100000, 2),
            price: Decimal::new(85000, 2),
            discount: Decimal::new(15000, 2),
            gst: Decimal::new(1800, 2),
        }
    }

    #[test]
    fn status_round_trip() {
        for status in [
            ProductStatus::Pending,
            ProductStatus::PendingReview,
            ProductStatus::Approved,
            ProductStatus::Rejected,
        ] {
            assert_eq!(ProductStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ProductStatus::from_str("archived"), None);
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn price_above_mrp_rejected() {
        let mut req = request();
        req.price = Decimal::new(200000, 2);
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_category_rejected() {
        let mut req = request();
        req.category = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(1, 10, 101);
        assert_eq!(p.pages, 11);
    }
}
