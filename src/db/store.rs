//! Product store seam used by the enhancement worker
//!
//! The worker only ever reads a product row and commits the enhancement
//! result; it never touches user-editable commercial fields. Keeping that
//! surface behind a trait lets tests substitute an in-memory store.

use crate::error::Result;
use crate::models::Product;
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Load a product by id, or None if it does not exist
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>>;

    /// Record the result of an enhancement run as one atomic unit:
    /// insert one `pending` image row per uploaded variant URL and flip the
    /// product to `pending_review`. Either everything commits or nothing
    /// does; a URL must already be durably stored before it is passed here.
    async fn persist_enhancement(&self, product_id: i64, image_urls: &[String]) -> Result<()>;
}

/// PostgreSQL-backed product store
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
        let product = super::product_repo::find_product_by_id(&self.pool, product_id).await?;
        Ok(product)
    }

    async fn persist_enhancement(&self, product_id: i64, image_urls: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for url in image_urls {
            sqlx::query(
                r#"
                INSERT INTO product_images (product_id, image_url, status)
                VALUES ($1, $2, 'pending')
                "#,
            )
            .bind(product_id)
            .bind(url)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE products
            SET status = 'pending_review', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
