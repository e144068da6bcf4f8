//! Upload handlers - presigned URL issuance for direct client uploads
//!
//! The mobile client PUTs raw images straight to object storage using a
//! presigned URL, then references the returned public URL as `raw_image`
//! when creating the product.

use crate::error::{AppError, Result};
use crate::services::ObjectStorage;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PresignedUrlRequest {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub file_url: String,
    pub expires_in: u64,
}

/// Issue a presigned PUT URL for a raw product image
pub async fn presigned_url(
    storage: web::Data<Arc<dyn ObjectStorage>>,
    req: web::Json<PresignedUrlRequest>,
) -> Result<HttpResponse> {
    if req.filename.trim().is_empty() {
        return Err(AppError::Validation("filename must not be empty".to_string()));
    }
    if !req.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "unsupported content type: {}",
            req.content_type
        )));
    }

    // Fresh key per request so client filenames can never collide
    let key = format!("products/{}{}", Uuid::new_v4(), extension_of(&req.filename));
    let presigned = storage.presign_upload(&key, &req.content_type).await?;

    Ok(HttpResponse::Ok().json(PresignedUrlResponse {
        upload_url: presigned.upload_url,
        file_url: presigned.public_url,
        expires_in: presigned.expires_in_secs,
    }))
}

/// File extension of `filename` including the dot, or empty when absent
fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}
