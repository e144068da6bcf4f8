//! Catalog Service
//!
//! Backend for product listings with asynchronous AI image enhancement.
//! Products are created through the HTTP API with a raw image already in
//! object storage; a queue-driven background worker generates enhanced
//! variants and records them once they are durably stored.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod workers;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
