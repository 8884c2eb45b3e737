/// Stock adjustments
///
/// Each adjustment is a single statement, so concurrent calls against the same
/// warehouse/product row never lose an update and never drive `qty` negative.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::audit::{AuditLog, AuditStatus};
use crate::auth::SessionUser;
use crate::error::{is_foreign_key_violation, AppError, InventoryError};
use crate::models::{StockAdjustment, StockLevel};
use crate::validators::validate_quantity;

/// POST /stock
///
/// Adds `qty` to the warehouse/product row, creating it on first use.
pub async fn stock(
    form: web::Json<StockAdjustment>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let qty = validate_quantity(form.qty)?;

    let level = sqlx::query_as::<_, StockLevel>(
        r#"
        INSERT INTO stock (warehouse_id, product_id, qty, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (warehouse_id, product_id)
        DO UPDATE SET qty = stock.qty + EXCLUDED.qty, updated_at = EXCLUDED.updated_at
        RETURNING warehouse_id, product_id, qty, created_at, updated_at
        "#,
    )
    .bind(form.warehouse_id)
    .bind(form.product_id)
    .bind(qty)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            AppError::Inventory(InventoryError::UnknownProductOrWarehouse)
        } else {
            AppError::from(e)
        }
    })?;

    audit("STOCK", &user, &level, qty);
    Ok(HttpResponse::Ok().json(level))
}

/// POST /unstock
///
/// # Errors
/// - 422 `NO_STOCK`: nothing held for this warehouse/product
/// - 422 `INSUFFICIENT_QUANTITY`: the deduction would go below zero
pub async fn unstock(
    form: web::Json<StockAdjustment>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let qty = validate_quantity(form.qty)?;

    let level = sqlx::query_as::<_, StockLevel>(
        r#"
        UPDATE stock
        SET qty = qty - $3, updated_at = $4
        WHERE warehouse_id = $1 AND product_id = $2 AND qty >= $3
        RETURNING warehouse_id, product_id, qty, created_at, updated_at
        "#,
    )
    .bind(form.warehouse_id)
    .bind(form.product_id)
    .bind(qty)
    .bind(Utc::now())
    .fetch_optional(pool.get_ref())
    .await?;

    let level = match level {
        Some(level) => level,
        None => {
            let available = sqlx::query_scalar::<_, f64>(
                "SELECT qty FROM stock WHERE warehouse_id = $1 AND product_id = $2",
            )
            .bind(form.warehouse_id)
            .bind(form.product_id)
            .fetch_optional(pool.get_ref())
            .await?;

            let err = shortfall(available, qty);
            AuditLog::new("UNSTOCK", "stock", AuditStatus::Failure, err.to_string())
                .with_user(&user.email)
                .with_resource_id(format!("{}/{}", form.warehouse_id, form.product_id))
                .record();
            return Err(err.into());
        }
    };

    audit("UNSTOCK", &user, &level, qty);
    Ok(HttpResponse::Ok().json(level))
}

/// Why a deduction of `requested` could not be applied
fn shortfall(available: Option<f64>, requested: f64) -> InventoryError {
    match available {
        None => InventoryError::NoStock,
        Some(available) if available <= 0.0 => InventoryError::NoStock,
        Some(available) => InventoryError::InsufficientQuantity {
            available,
            requested,
        },
    }
}

fn audit(action: &'static str, user: &SessionUser, level: &StockLevel, qty: f64) {
    AuditLog::new(
        action,
        "stock",
        AuditStatus::Success,
        format!("Adjusted by {}, now {}", qty, level.qty),
    )
    .with_user(&user.email)
    .with_resource_id(format!("{}/{}", level.warehouse_id, level.product_id))
    .record();
}
