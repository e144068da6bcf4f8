//! Image enhancement worker
//!
//! Long-running consumer of the enhancement queue. Each message names one
//! product; the per-item pipeline downloads its raw image, generates N
//! enhanced variants, uploads the successful ones, and commits the image
//! rows together with the product's move to `pending_review` in a single
//! transaction. The message is acknowledged only after that commit, so a
//! crash anywhere earlier leaves the message to be redelivered.
//!
//! Many worker processes may poll the same queue; the queue's visibility
//! timeout keeps a delivery leased to one consumer at a time, and the final
//! transaction is the only cross-worker coordination point. A redelivered
//! product is simply re-run from the start — the accepted cost is extra
//! image rows when a prior attempt partially completed, never corrupt rows.

use crate::db::ProductStore;
use crate::error::{AppError, Result};
use crate::services::queue::QueueMessage;
use crate::services::{prompts, storage, EnhancementQueue, GeneratedImage, ImageTransform, ObjectStorage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Worker tuning knobs
#[derive(Clone, Debug)]
pub struct WorkerSettings {
    /// Enhanced variants to attempt per product (>= 1)
    pub image_count: u32,
    /// Max messages per poll
    pub max_messages: i32,
    /// Long-poll wait when the queue is empty
    pub wait_time_secs: i32,
    /// Sleep after a failed poll before retrying
    pub poll_backoff: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            image_count: 3,
            max_messages: 1,
            wait_time_secs: 20,
            poll_backoff: Duration::from_secs(5),
        }
    }
}

/// Result of one successful pipeline run
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// At least one variant was persisted; the product is `pending_review`
    Enhanced { images: usize },
    /// The product row no longer exists; redelivery cannot help
    MissingProduct,
}

/// Handle to a spawned worker; `stop()` shuts it down and waits for the
/// in-flight item, dropping it stops the loop without waiting
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal shutdown and wait for the in-flight item to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "Enhancement worker task panicked");
        }
    }
}

/// Queue-driven image enhancement worker
pub struct EnhancementWorker {
    queue: Arc<dyn EnhancementQueue>,
    storage: Arc<dyn ObjectStorage>,
    transform: Arc<dyn ImageTransform>,
    store: Arc<dyn ProductStore>,
    settings: WorkerSettings,
}

impl EnhancementWorker {
    pub fn new(
        queue: Arc<dyn EnhancementQueue>,
        storage: Arc<dyn ObjectStorage>,
        transform: Arc<dyn ImageTransform>,
        store: Arc<dyn ProductStore>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            storage,
            transform,
            store,
            settings,
        }
    }

    /// Start the consumption loop on a background task.
    ///
    /// Consumes the worker, so one constructed worker can only ever run one
    /// loop; run several processes (or construct several workers) to scale
    /// out against the shared queue.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx));
        WorkerHandle {
            shutdown_tx,
            handle,
        }
    }

    /// Main consumption loop
    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            image_count = self.settings.image_count,
            wait_time_secs = self.settings.wait_time_secs,
            "Enhancement worker started"
        );

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // A dropped sender means the handle is gone; stop rather
                    // than poll a channel that can never signal again.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }

                polled = self.queue.receive(
                    self.settings.max_messages,
                    self.settings.wait_time_secs,
                ) => {
                    match polled {
                        Ok(messages) => {
                            for message in messages {
                                // Finish the in-flight item even when a stop
                                // arrived mid-batch; only further items are
                                // abandoned (their leases lapse back into
                                // visibility).
                                if *shutdown_rx.borrow() {
                                    break;
                                }
                                self.handle_message(message).await;
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Queue poll failed, backing off");
                            tokio::time::sleep(self.settings.poll_backoff).await;
                        }
                    }
                }
            }
        }

        info!("Enhancement worker stopped");
    }

    /// Process one delivery and decide whether to acknowledge it
    async fn handle_message(&self, message: QueueMessage) {
        let product_id = message.product_id;
        info!(product_id, "Received enhancement message");

        match self.process_product(product_id).await {
            Ok(PipelineOutcome::Enhanced { images }) => {
                info!(product_id, images, "Product enhanced successfully");
                self.acknowledge(product_id, &message.receipt).await;
            }
            Ok(PipelineOutcome::MissingProduct) => {
                warn!(product_id, "Product not found, discarding message");
                self.acknowledge(product_id, &message.receipt).await;
            }
            Err(e) => {
                // No ack: the visibility timeout will expire and the queue
                // redelivers the message, to this worker or another.
                warn!(
                    product_id,
                    error = %e,
                    "Enhancement failed, message left for redelivery"
                );
            }
        }
    }

    async fn acknowledge(&self, product_id: i64, receipt: &str) {
        if let Err(e) = self.queue.delete(receipt).await {
            // The work committed; the stale delivery will resurface and be
            // re-run, which the pipeline tolerates.
            error!(product_id, error = %e, "Failed to delete processed message");
        }
    }

    /// Per-item enhancement pipeline for a single product id.
    ///
    /// Returns `Ok` when the delivery should be acknowledged and `Err` when
    /// it should be left for redelivery.
    pub async fn process_product(&self, product_id: i64) -> Result<PipelineOutcome> {
        // Fetch
        let Some(product) = self.store.get_product(product_id).await? else {
            return Ok(PipelineOutcome::MissingProduct);
        };

        info!(product_id, category = %product.category, "Processing product");

        // Download
        let raw_image = self.storage.download(&product.raw_image).await?;
        let raw_content_type = storage::content_type_for_path(&product.raw_image);

        // Generate: one independent call per variant, collecting the
        // successes before any item-level decision is made.
        let variants = self
            .generate_variants(product_id, &product.category, &raw_image, raw_content_type)
            .await;
        if variants.is_empty() {
            return Err(AppError::Transform(format!(
                "all {} variant generations failed for product {product_id}",
                self.settings.image_count
            )));
        }

        // Upload each surviving variant under a fresh key; an upload failure
        // drops that variant only.
        let mut image_urls = Vec::with_capacity(variants.len());
        for (index, image) in variants.iter().enumerate() {
            let key = format!(
                "product-images/{}/{}.{}",
                product_id,
                Uuid::new_v4(),
                storage::extension_for_content_type(&image.content_type)
            );

            match self
                .storage
                .upload(&key, image.data.clone(), &image.content_type)
                .await
            {
                Ok(url) => {
                    info!(product_id, variant = index + 1, url = %url, "Uploaded enhanced image");
                    image_urls.push(url);
                }
                Err(e) => {
                    warn!(
                        product_id,
                        variant = index + 1,
                        error = %e,
                        "Variant upload failed, dropping it from this run"
                    );
                }
            }
        }
        if image_urls.is_empty() {
            return Err(AppError::Storage(format!(
                "no enhanced image could be uploaded for product {product_id}"
            )));
        }

        // Persist + transition in one transaction, then let the caller ack.
        if let Err(e) = self.store.persist_enhancement(product_id, &image_urls).await {
            // The uploaded blobs now have no rows pointing at them; that is
            // the tolerated orphan case, but it must be visible to operators.
            error!(
                product_id,
                orphaned_uploads = image_urls.len(),
                error = %e,
                "Failed to commit enhancement result; uploaded blobs are orphaned"
            );
            return Err(e);
        }

        Ok(PipelineOutcome::Enhanced {
            images: image_urls.len(),
        })
    }

    /// Run N independent transform calls and keep whatever succeeded
    async fn generate_variants(
        &self,
        product_id: i64,
        category: &str,
        raw_image: &[u8],
        content_type: &str,
    ) -> Vec<GeneratedImage> {
        let mut generated = Vec::with_capacity(self.settings.image_count as usize);

        for variant in 0..self.settings.image_count {
            let prompt = prompts::prompt_for(category, variant);
            match self.transform.generate(raw_image, content_type, prompt).await {
                Ok(image) => generated.push(image),
                Err(e) => {
                    warn!(
                        product_id,
                        variant = variant + 1,
                        error = %e,
                        "Variant generation failed"
                    );
                }
            }
        }

        generated
    }
}
