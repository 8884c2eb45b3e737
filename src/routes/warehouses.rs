use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{deleted, record_not_found};
use crate::audit::{AuditLog, AuditStatus};
use crate::auth::SessionUser;
use crate::error::AppError;
use crate::models::{NewWarehouse, Warehouse};
use crate::validators::{is_valid_address, is_valid_name};

const WAREHOUSE_COLUMNS: &str = "id, name, address, created_at, updated_at";

/// POST /warehouse
pub async fn create_warehouse(
    form: web::Json<NewWarehouse>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let name = is_valid_name("name", &form.name)?;
    let address = is_valid_address(&form.address)?;

    let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
        r#"
        INSERT INTO warehouses (id, name, address, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING {}
        "#,
        WAREHOUSE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&address)
    .bind(Utc::now())
    .fetch_one(pool.get_ref())
    .await?;

    AuditLog::new("CREATE", "warehouse", AuditStatus::Success, "Warehouse created")
        .with_user(&user.email)
        .with_resource_id(warehouse.id.to_string())
        .record();

    Ok(HttpResponse::Created().json(warehouse))
}

/// GET /warehouse/{id}
pub async fn get_warehouse(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let warehouse = sqlx::query_as::<_, Warehouse>(&format!(
        "SELECT {} FROM warehouses WHERE id = $1",
        WAREHOUSE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| record_not_found(&id))?;

    Ok(HttpResponse::Ok().json(warehouse))
}

/// DELETE /warehouse/{id}
pub async fn delete_warehouse(
    id: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    user: web::ReqData<SessionUser>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(record_not_found(&id));
    }

    AuditLog::new("DELETE", "warehouse", AuditStatus::Success, "Warehouse deleted")
        .with_user(&user.email)
        .with_resource_id(id.to_string())
        .record();

    Ok(HttpResponse::Ok().json(deleted()))
}
