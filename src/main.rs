//! Catalog Service - HTTP server with embedded enhancement worker
//!
//! Serves the product API and runs one enhancement worker as a background
//! task. Additional worker capacity runs as separate `enhance-worker`
//! processes against the same queue.

use actix_web::{middleware, web, App, HttpServer};
use catalog_service::db::{PgProductStore, ProductStore};
use catalog_service::services::{
    queue, storage, EnhancementQueue, GeminiClient, ImageTransform, ObjectStorage,
    S3ObjectStorage, SqsQueue,
};
use catalog_service::workers::{EnhancementWorker, WorkerSettings};
use catalog_service::{handlers, Config};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(address = %bind_address, "Catalog service starting");

    // Database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("DB connect failed: {e}")))?;

    // Service clients
    let s3 = storage::s3_client(&config.s3).await;
    let object_storage: Arc<dyn ObjectStorage> = Arc::new(
        S3ObjectStorage::new(s3, &config.s3)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
    );

    let sqs = queue::sqs_client(&config.s3).await;
    let enhancement_queue: Arc<dyn EnhancementQueue> =
        Arc::new(SqsQueue::new(sqs, config.queue.queue_url.clone()));

    let transform: Arc<dyn ImageTransform> = {
        let gemini = GeminiClient::new(config.gemini.api_key.clone(), config.gemini.model.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        if !gemini.is_configured() {
            tracing::warn!("GEMINI_API_KEY not set; enhancement calls will fail until configured");
        }
        Arc::new(gemini)
    };

    let product_store: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool.clone()));

    // Spawn the embedded enhancement worker
    let worker = EnhancementWorker::new(
        enhancement_queue.clone(),
        object_storage.clone(),
        transform,
        product_store,
        WorkerSettings {
            image_count: config.enhancement.image_count,
            max_messages: config.queue.max_messages,
            wait_time_secs: config.queue.wait_time_secs,
            poll_backoff: Duration::from_secs(config.enhancement.poll_backoff_secs),
        },
    );
    let worker_handle = worker.spawn();

    let pool_http = pool.clone();
    let storage_http = object_storage.clone();
    let queue_http = enhancement_queue.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool_http.clone()))
            .app_data(web::Data::new(storage_http.clone()))
            .app_data(web::Data::new(queue_http.clone()))
            .wrap(middleware::Logger::default())
            .route("/api/v1/health", web::get().to(handlers::health))
            .route("/health/live", web::get().to(handlers::live))
            .route("/health/ready", web::get().to(handlers::ready))
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/products")
                            .route("", web::post().to(handlers::create_product))
                            .route("", web::get().to(handlers::list_products))
                            .route("/bulk", web::post().to(handlers::bulk_create_products))
                            .route("/{id}", web::get().to(handlers::get_product))
                            .route("/{id}", web::put().to(handlers::update_product))
                            .route("/{id}", web::delete().to(handlers::delete_product))
                            .route("/{id}/images", web::get().to(handlers::list_product_images)),
                    )
                    .service(
                        web::scope("/uploads")
                            .route("/presigned-url", web::post().to(handlers::presigned_url)),
                    ),
            )
    })
    .bind(&bind_address)?
    .run();

    let result = server.await;

    // The HTTP server has handled its shutdown signal; stop the worker and
    // let its in-flight item finish.
    tracing::info!("Stopping enhancement worker");
    worker_handle.stop().await;
    tracing::info!("Catalog service stopped");

    result
}
