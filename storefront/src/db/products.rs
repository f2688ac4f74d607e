//! Product catalog queries

use shared::models::{Product, Size};
use sqlx::{PgConnection, PgPool};

#[derive(sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub active: bool,
    pub stock_s: i32,
    pub stock_m: i32,
    pub stock_l: i32,
    pub created_at: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            price_cents: row.price_cents,
            currency: row.currency,
            active: row.active,
            stock_s: row.stock_s,
            stock_m: row.stock_m,
            stock_l: row.stock_l,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, image_url, price_cents, currency, active, \
     stock_s, stock_m, stock_l, created_at";

pub async fn list_active(pool: &PgPool) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE active = TRUE ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Ids from `ids` that exist in the catalog, checked inside a transaction
pub async fn existing_ids(
    conn: &mut PgConnection,
    ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Conditional decrement of one size counter.
///
/// Returns false when the row holds less than `quantity`; the caller must
/// abort the transaction.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: &str,
    size: Size,
    quantity: i32,
) -> Result<bool, sqlx::Error> {
    let column = stock_column(size);
    let result = sqlx::query(&format!(
        "UPDATE products SET {column} = {column} - $1 WHERE id = $2 AND {column} >= $1"
    ))
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

fn stock_column(size: Size) -> &'static str {
    match size {
        Size::S => "stock_s",
        Size::M => "stock_m",
        Size::L => "stock_l",
    }
}
