use crate::models::ProductImage;
use sqlx::PgPool;

/// List enhanced images for a product, oldest first
pub async fn find_images_by_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ProductImage>, sqlx::Error> {
    let images = sqlx::query_as::<_, ProductImage>(
        r#"
        SELECT id, product_id, image_url, status, created_at, updated_at
        FROM product_images
        WHERE product_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}
