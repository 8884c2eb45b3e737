/// Record listing
///
/// `/list/{model}` with optional exact-match filters. Unset filters are bound
/// as NULL so every query stays a single prepared statement.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Model, Product, StockLevel, Warehouse};

#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub code: Option<String>,
    pub name: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

/// GET /list/{model}
pub async fn list_records(
    model: web::Path<String>,
    filter: web::Query<ListFilter>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let model: Model = model.parse()?;

    let body = match model {
        Model::Product => {
            let rows = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, code, name, description, price, created_at, updated_at
                FROM products
                WHERE ($1::text IS NULL OR code = $1)
                  AND ($2::text IS NULL OR name = $2)
                ORDER BY created_at
                "#,
            )
            .bind(&filter.code)
            .bind(&filter.name)
            .fetch_all(pool.get_ref())
            .await?;
            serde_json::to_value(rows)
        }
        Model::Warehouse => {
            let rows = sqlx::query_as::<_, Warehouse>(
                r#"
                SELECT id, name, address, created_at, updated_at
                FROM warehouses
                WHERE ($1::text IS NULL OR name = $1)
                ORDER BY created_at
                "#,
            )
            .bind(&filter.name)
            .fetch_all(pool.get_ref())
            .await?;
            serde_json::to_value(rows)
        }
        Model::Stock => {
            let rows = sqlx::query_as::<_, StockLevel>(
                r#"
                SELECT warehouse_id, product_id, qty, created_at, updated_at
                FROM stock
                WHERE ($1::uuid IS NULL OR warehouse_id = $1)
                  AND ($2::uuid IS NULL OR product_id = $2)
                ORDER BY created_at
                "#,
            )
            .bind(filter.warehouse_id)
            .bind(filter.product_id)
            .fetch_all(pool.get_ref())
            .await?;
            serde_json::to_value(rows)
        }
    }
    .map_err(|e| AppError::Internal(format!("Failed to serialize records: {}", e)))?;

    Ok(HttpResponse::Ok().json(body))
}
