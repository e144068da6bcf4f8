use crate::models::{CreateProductRequest, Product, UpdateProductRequest};
use sqlx::{PgPool, Row};

const PRODUCT_COLUMNS: &str =
    "id, category, raw_image, mrp, price, discount, gst, status, created_at, updated_at";

/// Create a new product with status "pending"
/// Returns the created product
pub async fn create_product(
    pool: &PgPool,
    req: &CreateProductRequest,
) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (category, raw_image, mrp, price, discount, gst, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(&req.category)
    .bind(&req.raw_image)
    .bind(req.mrp)
    .bind(req.price)
    .bind(req.discount)
    .bind(req.gst)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

/// Insert a batch of already-validated products in one transaction.
/// Either every row lands or none do.
pub async fn create_products_bulk(
    pool: &PgPool,
    requests: &[CreateProductRequest],
) -> Result<Vec<Product>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(requests.len());

    for req in requests {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (category, raw_image, mrp, price, discount, gst, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&req.category)
        .bind(&req.raw_image)
        .bind(req.mrp)
        .bind(req.price)
        .bind(req.discount)
        .bind(req.gst)
        .fetch_one(&mut *tx)
        .await?;

        created.push(product);
    }

    tx.commit().await?;
    Ok(created)
}

/// Find a product by ID
pub async fn find_product_by_id(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1",
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// List products with optional status/category filters, newest first
pub async fn list_products(
    pool: &PgPool,
    status: Option<&str>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
        FROM products
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR category = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    ))
    .bind(status)
    .bind(category)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

/// Count products matching the list filters
pub async fn count_products(
    pool: &PgPool,
    status: Option<&str>,
    category: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as count
        FROM products
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::text IS NULL OR category = $2)
        "#,
    )
    .bind(status)
    .bind(category)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("count"))
}

/// Apply a partial update to a product's user-editable fields.
/// Returns the updated product, or None if it does not exist.
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    req: &UpdateProductRequest,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET category = COALESCE($2, category),
            mrp = COALESCE($3, mrp),
            price = COALESCE($4, price),
            discount = COALESCE($5, discount),
            gst = COALESCE($6, gst),
            status = COALESCE($7, status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(product_id)
    .bind(req.category.as_deref())
    .bind(req.mrp)
    .bind(req.price)
    .bind(req.discount)
    .bind(req.gst)
    .bind(req.status.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Delete a product; enhanced image rows cascade
pub async fn delete_product(pool: &PgPool, product_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
