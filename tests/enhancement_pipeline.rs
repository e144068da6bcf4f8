//! Enhancement pipeline tests
//!
//! Drives the worker and its per-item pipeline against in-memory fakes of
//! the queue, object storage, transform client, and product store, covering
//! partial success, total failure, missing products, download failures,
//! persist atomicity, concurrent deliveries, and ack behavior of the loop.

use async_trait::async_trait;
use bytes::Bytes;
use catalog_service::db::ProductStore;
use catalog_service::error::{AppError, Result};
use catalog_service::models::Product;
use catalog_service::services::{
    EnhancementQueue, GeneratedImage, ImageTransform, ObjectStorage, PresignedUpload,
    QueueMessage,
};
use catalog_service::workers::{EnhancementWorker, PipelineOutcome, WorkerSettings};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const RAW_URL: &str = "https://bucket.s3.us-east-1.amazonaws.com/products/raw.jpg";

// ========================================
// Fakes
// ========================================

#[derive(Default)]
struct FakeStore {
    products: Mutex<HashMap<i64, Product>>,
    images: Mutex<Vec<(i64, String)>>,
    fail_persist: AtomicBool,
}

impl FakeStore {
    fn with_product(product_id: i64, category: &str) -> Arc<Self> {
        let store = Self::default();
        store.products.lock().unwrap().insert(
            product_id,
            Product {
                id: product_id,
                category: category.to_string(),
                raw_image: RAW_URL.to_string(),
                mrp: Decimal::new(100000, 2),
                price: Decimal::new(85000, 2),
                discount: Decimal::new(15000, 2),
                gst: Decimal::new(1800, 2),
                status: "pending".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
        Arc::new(store)
    }

    fn status_of(&self, product_id: i64) -> String {
        self.products.lock().unwrap()[&product_id].status.clone()
    }

    fn image_rows(&self, product_id: i64) -> Vec<String> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == product_id)
            .map(|(_, url)| url.clone())
            .collect()
    }
}

#[async_trait]
impl ProductStore for FakeStore {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&product_id).cloned())
    }

    async fn persist_enhancement(&self, product_id: i64, image_urls: &[String]) -> Result<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            // Atomic failure: nothing lands
            return Err(AppError::Internal("injected transaction failure".to_string()));
        }

        let mut images = self.images.lock().unwrap();
        let mut products = self.products.lock().unwrap();
        for url in image_urls {
            images.push((product_id, url.clone()));
        }
        if let Some(product) = products.get_mut(&product_id) {
            product.status = "pending_review".to_string();
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeStorage {
    uploads: Mutex<HashMap<String, Bytes>>,
    upload_calls: AtomicU32,
    fail_upload_calls: Vec<u32>,
    fail_download: AtomicBool,
}

impl FakeStorage {
    fn failing_uploads(calls: Vec<u32>) -> Arc<Self> {
        Arc::new(Self {
            fail_upload_calls: calls,
            ..Self::default()
        })
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn download(&self, url: &str) -> Result<Bytes> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("connection reset fetching {url}")));
        }
        Ok(Bytes::from_static(b"raw image bytes"))
    }

    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> Result<String> {
        let call = self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload_calls.contains(&call) {
            return Err(AppError::Storage(format!("upload of {key} timed out")));
        }
        self.uploads.lock().unwrap().insert(key.to_string(), data);
        Ok(format!("https://cdn.test/{key}"))
    }

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<PresignedUpload> {
        Ok(PresignedUpload {
            upload_url: format!("https://cdn.test/presigned/{key}"),
            public_url: format!("https://cdn.test/{key}"),
            expires_in_secs: 3600,
        })
    }
}

#[derive(Default)]
struct FakeTransform {
    calls: AtomicU32,
    fail_calls: Vec<u32>,
}

impl FakeTransform {
    fn failing_calls(calls: Vec<u32>) -> Arc<Self> {
        Arc::new(Self {
            fail_calls: calls,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ImageTransform for FakeTransform {
    async fn generate(
        &self,
        _image: &[u8],
        _content_type: &str,
        _prompt: &str,
    ) -> Result<GeneratedImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.contains(&call) {
            return Err(AppError::Transform("generation timed out".to_string()));
        }
        Ok(GeneratedImage {
            data: Bytes::from(format!("enhanced-{call}")),
            content_type: "image/png".to_string(),
        })
    }
}

#[derive(Default)]
struct FakeQueue {
    messages: Mutex<VecDeque<QueueMessage>>,
    deleted: Mutex<Vec<String>>,
    sent: Mutex<Vec<i64>>,
    /// Remaining number of polls that fail before delivery resumes
    failing_polls: AtomicU32,
}

impl FakeQueue {
    fn with_messages(messages: Vec<QueueMessage>) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(messages.into_iter().collect()),
            ..Self::default()
        })
    }

    fn deleted_receipts(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnhancementQueue for FakeQueue {
    async fn send(&self, product_id: i64) -> Result<()> {
        self.sent.lock().unwrap().push(product_id);
        Ok(())
    }

    async fn receive(&self, max_messages: i32, _wait_time_secs: i32) -> Result<Vec<QueueMessage>> {
        if self.failing_polls.load(Ordering::SeqCst) > 0 {
            self.failing_polls.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::Queue("connection refused".to_string()));
        }

        let batch = {
            let mut queue = self.messages.lock().unwrap();
            let mut batch = Vec::new();
            while batch.len() < max_messages as usize {
                match queue.pop_front() {
                    Some(message) => batch.push(message),
                    None => break,
                }
            }
            batch
        };

        if batch.is_empty() {
            // Stand in for long-poll waiting so the loop does not spin
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(batch)
    }

    async fn delete(&self, receipt: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(receipt.to_string());
        Ok(())
    }
}

fn worker(
    queue: Arc<FakeQueue>,
    storage: Arc<FakeStorage>,
    transform: Arc<FakeTransform>,
    store: Arc<FakeStore>,
    image_count: u32,
) -> EnhancementWorker {
    EnhancementWorker::new(
        queue,
        storage,
        transform,
        store,
        WorkerSettings {
            image_count,
            max_messages: 10,
            wait_time_secs: 0,
            poll_backoff: Duration::from_millis(10),
        },
    )
}

// ========================================
// Pipeline tests
// ========================================

#[tokio::test]
async fn all_variants_succeed() {
    let store = FakeStore::with_product(42, "Electronics");
    let storage = Arc::new(FakeStorage::default());
    let transform = Arc::new(FakeTransform::default());
    let w = worker(
        Arc::new(FakeQueue::default()),
        storage.clone(),
        transform,
        store.clone(),
        3,
    );

    let outcome = w.process_product(42).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::Enhanced { images: 3 });
    let rows = store.image_rows(42);
    assert_eq!(rows.len(), 3);
    for url in &rows {
        assert!(url.starts_with("https://cdn.test/product-images/42/"), "{url}");
    }
    assert_eq!(store.status_of(42), "pending_review");
    assert_eq!(storage.uploads.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn partial_generation_failure_still_succeeds() {
    // Variant 2 of 3 times out; the run proceeds with the other two.
    let store = FakeStore::with_product(7, "Clothing");
    let transform = FakeTransform::failing_calls(vec![1]);
    let w = worker(
        Arc::new(FakeQueue::default()),
        Arc::new(FakeStorage::default()),
        transform,
        store.clone(),
        3,
    );

    let outcome = w.process_product(7).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::Enhanced { images: 2 });
    assert_eq!(store.image_rows(7).len(), 2);
    assert_eq!(store.status_of(7), "pending_review");
}

#[tokio::test]
async fn total_generation_failure_fails_the_item() {
    let store = FakeStore::with_product(11, "Electronics");
    let transform = FakeTransform::failing_calls(vec![0, 1, 2]);
    let w = worker(
        Arc::new(FakeQueue::default()),
        Arc::new(FakeStorage::default()),
        transform,
        store.clone(),
        3,
    );

    let result = w.process_product(11).await;

    assert!(result.is_err());
    assert!(store.image_rows(11).is_empty());
    assert_eq!(store.status_of(11), "pending");
}

#[tokio::test]
async fn missing_product_is_discarded() {
    let store = Arc::new(FakeStore::default());
    let w = worker(
        Arc::new(FakeQueue::default()),
        Arc::new(FakeStorage::default()),
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );

    let outcome = w.process_product(99).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::MissingProduct);
    assert!(store.image_rows(99).is_empty());
}

#[tokio::test]
async fn download_failure_fails_the_item_without_writes() {
    let store = FakeStore::with_product(5, "Electronics");
    let storage = Arc::new(FakeStorage::default());
    storage.fail_download.store(true, Ordering::SeqCst);
    let transform = Arc::new(FakeTransform::default());
    let w = worker(
        Arc::new(FakeQueue::default()),
        storage,
        transform.clone(),
        store.clone(),
        3,
    );

    let result = w.process_product(5).await;

    assert!(result.is_err());
    assert!(store.image_rows(5).is_empty());
    assert_eq!(store.status_of(5), "pending");
    // Download failed before any transform call was made
    assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn persist_failure_is_atomic() {
    // Uploads succeed but the commit fails; the store must show no rows and
    // the product must stay pending so redelivery can retry.
    let store = FakeStore::with_product(13, "Electronics");
    store.fail_persist.store(true, Ordering::SeqCst);
    let storage = Arc::new(FakeStorage::default());
    let w = worker(
        Arc::new(FakeQueue::default()),
        storage.clone(),
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );

    let result = w.process_product(13).await;

    assert!(result.is_err());
    assert!(store.image_rows(13).is_empty());
    assert_eq!(store.status_of(13), "pending");
    // The uploaded blobs are orphaned, which is the accepted inconsistency
    assert_eq!(storage.uploads.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn upload_failure_drops_only_that_variant() {
    let store = FakeStore::with_product(21, "ring");
    let storage = FakeStorage::failing_uploads(vec![0]);
    let w = worker(
        Arc::new(FakeQueue::default()),
        storage,
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );

    let outcome = w.process_product(21).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::Enhanced { images: 2 });
    assert_eq!(store.image_rows(21).len(), 2);
}

#[tokio::test]
async fn total_upload_failure_fails_the_item() {
    let store = FakeStore::with_product(22, "ring");
    let storage = FakeStorage::failing_uploads(vec![0, 1, 2]);
    let w = worker(
        Arc::new(FakeQueue::default()),
        storage,
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );

    assert!(w.process_product(22).await.is_err());
    assert!(store.image_rows(22).is_empty());
    assert_eq!(store.status_of(22), "pending");
}

#[tokio::test]
async fn concurrent_deliveries_of_the_same_product_both_complete() {
    // Two in-flight deliveries for the same id may over-produce rows but
    // never corrupt them.
    let store = FakeStore::with_product(5, "Electronics");
    let w = worker(
        Arc::new(FakeQueue::default()),
        Arc::new(FakeStorage::default()),
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );

    let (first, second) = tokio::join!(w.process_product(5), w.process_product(5));

    assert_eq!(first.unwrap(), PipelineOutcome::Enhanced { images: 3 });
    assert_eq!(second.unwrap(), PipelineOutcome::Enhanced { images: 3 });
    assert_eq!(store.image_rows(5).len(), 6);
    assert_eq!(store.status_of(5), "pending_review");
}

// ========================================
// Consumption loop tests
// ========================================

#[tokio::test]
async fn loop_acks_successes_and_retains_failures() {
    // Three deliveries: product 42 succeeds (ack), product 99 is missing
    // (ack, redelivery cannot help), product 7 fails every generation
    // (no ack, left for redelivery).
    let store = FakeStore::with_product(42, "Electronics");
    store.products.lock().unwrap().insert(
        7,
        Product {
            id: 7,
            category: "Clothing".to_string(),
            raw_image: RAW_URL.to_string(),
            mrp: Decimal::new(50000, 2),
            price: Decimal::new(40000, 2),
            discount: Decimal::new(10000, 2),
            gst: Decimal::new(1200, 2),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        },
    );

    let queue = FakeQueue::with_messages(vec![
        QueueMessage {
            product_id: 42,
            receipt: "r-42".to_string(),
        },
        QueueMessage {
            product_id: 99,
            receipt: "r-99".to_string(),
        },
        QueueMessage {
            product_id: 7,
            receipt: "r-7".to_string(),
        },
    ]);
    // Product 42 consumes transform calls 0..3; product 7 gets 3..6, all failing.
    let transform = FakeTransform::failing_calls(vec![3, 4, 5]);

    let w = worker(
        queue.clone(),
        Arc::new(FakeStorage::default()),
        transform,
        store.clone(),
        3,
    );
    let handle = w.spawn();

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.stop().await;

    let deleted = queue.deleted_receipts();
    assert!(deleted.contains(&"r-42".to_string()));
    assert!(deleted.contains(&"r-99".to_string()));
    assert!(!deleted.contains(&"r-7".to_string()));
    // Each acked delivery was deleted exactly once
    assert_eq!(deleted.len(), 2);

    assert_eq!(store.status_of(42), "pending_review");
    assert_eq!(store.image_rows(42).len(), 3);
    assert_eq!(store.status_of(7), "pending");
    assert!(store.image_rows(7).is_empty());
}

#[tokio::test]
async fn loop_survives_poll_failures_and_backs_off() {
    // The first two polls fail outright; the loop must back off, keep
    // polling, and still process and ack the queued message.
    let store = FakeStore::with_product(42, "Electronics");
    let queue = FakeQueue::with_messages(vec![QueueMessage {
        product_id: 42,
        receipt: "r-42".to_string(),
    }]);
    queue.failing_polls.store(2, Ordering::SeqCst);

    let w = worker(
        queue.clone(),
        Arc::new(FakeStorage::default()),
        Arc::new(FakeTransform::default()),
        store.clone(),
        3,
    );
    let handle = w.spawn();

    // Two failed polls at 10ms backoff each, then the real delivery
    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.stop().await;

    assert_eq!(queue.failing_polls.load(Ordering::SeqCst), 0);
    assert_eq!(queue.deleted_receipts(), vec!["r-42".to_string()]);
    assert_eq!(store.status_of(42), "pending_review");
}

#[tokio::test]
async fn loop_stops_cleanly_on_shutdown() {
    let w = worker(
        Arc::new(FakeQueue::default()),
        Arc::new(FakeStorage::default()),
        Arc::new(FakeTransform::default()),
        Arc::new(FakeStore::default()),
        3,
    );
    let handle = w.spawn();

    tokio::time::sleep(Duration::from_millis(20)).await;
    // stop() joins the task; completing is the assertion
    handle.stop().await;
}
