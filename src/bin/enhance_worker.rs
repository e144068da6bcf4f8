//! Enhance Worker - standalone queue consumer for image enhancement
//!
//! Runs the same enhancement loop the main service embeds, as its own
//! process. Any number of these can be pointed at the shared queue; the
//! queue's visibility timeout keeps deliveries from being double-processed.
//!
//! Environment variables: the same DATABASE_URL / S3_* / SQS_* / GEMINI_*
//! variables the main service reads.

use catalog_service::db::{PgProductStore, ProductStore};
use catalog_service::services::{
    queue, storage, EnhancementQueue, GeminiClient, ImageTransform, ObjectStorage,
    S3ObjectStorage, SqsQueue,
};
use catalog_service::workers::{EnhancementWorker, WorkerSettings};
use catalog_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("enhance_worker=info".parse().expect("valid directive"))
                .add_directive("catalog_service=info".parse().expect("valid directive")),
        )
        .init();

    info!("Starting enhancement worker");

    dotenvy::dotenv().ok();
    let config = Config::from_env().map_err(|e| format!("{e}"))?;
    info!(
        queue_url = %config.queue.queue_url,
        image_count = config.enhancement.image_count,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| format!("DB connect failed: {e}"))?;

    let s3 = storage::s3_client(&config.s3).await;
    let object_storage: Arc<dyn ObjectStorage> =
        Arc::new(S3ObjectStorage::new(s3, &config.s3).map_err(|e| format!("{e}"))?);

    let sqs = queue::sqs_client(&config.s3).await;
    let enhancement_queue: Arc<dyn EnhancementQueue> =
        Arc::new(SqsQueue::new(sqs, config.queue.queue_url.clone()));

    let transform: Arc<dyn ImageTransform> = Arc::new(
        GeminiClient::new(config.gemini.api_key.clone(), config.gemini.model.clone())
            .map_err(|e| format!("{e}"))?,
    );

    let product_store: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool));

    let worker = EnhancementWorker::new(
        enhancement_queue,
        object_storage,
        transform,
        product_store,
        WorkerSettings {
            image_count: config.enhancement.image_count,
            max_messages: config.queue.max_messages,
            wait_time_secs: config.queue.wait_time_secs,
            poll_backoff: Duration::from_secs(config.enhancement.poll_backoff_secs),
        },
    );
    let handle = worker.spawn();

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");
    info!("Shutdown signal received");

    handle.stop().await;
    info!("Enhancement worker stopped");
    Ok(())
}
