use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{deleted, record_not_found};
use crate::audit::{AuditLog, AuditStatus};
use crate::auth::SessionUser;
use crate::error::AppError;
use crate::models::{NewProduct, Product};
use crate::validators::{is_valid_name, is_valid_product_code, validate_price};

const PRODUCT_COLUMNS: &str = "id, code, name, description, price, created_at, updated_at";

/// POST /product
pub async fn create_product(
    form: web::Json<NewProduct>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let code = is_valid_product_code(&form.code)?;
    let name = is_valid_name("name", &form.name)?;
    let description = form
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let price = validate_price(form.price)?;

    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (id, code, name, description, price, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&code)
    .bind(&name)
    .bind(&description)
    .bind(price)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    AuditLog::new("CREATE", "product", AuditStatus::Success, "Product created")
        .with_user(&user.email)
        .with_resource_id(product.id.to_string())
        .record();

    Ok(HttpResponse::Created().json(product))
}

/// GET /product/{id}
pub async fn get_product(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = $1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| record_not_found(&id))?;

    Ok(HttpResponse::Ok().json(product))
}

/// DELETE /product/{id}
///
/// Stock rows for the product go with it.
pub async fn delete_product(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(record_not_found(&id));
    }

    AuditLog::new("DELETE", "product", AuditStatus::Success, "Product deleted")
        .with_user(&user.email)
        .with_resource_id(id.to_string())
        .record();

    Ok(HttpResponse::Ok().json(deleted()))
}
