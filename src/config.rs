//! Configuration management for catalog-service
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{AppError, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub s3: S3Config,
    pub queue: QueueConfig,
    pub gemini: GeminiConfig,
    pub enhancement: EnhancementConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    /// Optional custom domain for public object URLs
    pub cdn_domain: Option<String>,
    pub presigned_url_expiration_secs: u64,
}

#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub queue_url: String,
    pub max_messages: i32,
    pub wait_time_secs: i32,
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct EnhancementConfig {
    /// Number of enhanced variants to generate per product (>= 1)
    pub image_count: u32,
    /// Backoff between queue polls after a poll failure
    pub poll_backoff_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let image_count: u32 = std::env::var("ENHANCED_IMAGES_COUNT")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);
        if image_count == 0 {
            return Err(AppError::Configuration(
                "ENHANCED_IMAGES_COUNT must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            app: AppConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| AppError::Configuration("DATABASE_URL not set".to_string()))?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            s3: S3Config {
                bucket: std::env::var("S3_BUCKET")
                    .map_err(|_| AppError::Configuration("S3_BUCKET not set".to_string()))?,
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
                cdn_domain: std::env::var("CDN_DOMAIN").ok(),
                presigned_url_expiration_secs: std::env::var("PRESIGNED_URL_EXPIRATION_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            },
            queue: QueueConfig {
                queue_url: std::env::var("SQS_QUEUE_URL")
                    .map_err(|_| AppError::Configuration("SQS_QUEUE_URL not set".to_string()))?,
                max_messages: std::env::var("SQS_MAX_MESSAGES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1),
                wait_time_secs: std::env::var("SQS_WAIT_TIME_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
            },
            gemini: GeminiConfig {
                api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            },
            enhancement: EnhancementConfig {
                image_count,
                poll_backoff_secs: std::env::var("WORKER_POLL_BACKOFF_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            },
        })
    }
}
