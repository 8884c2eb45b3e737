mod auth;
mod health_check;
mod list;
mod products;
mod stock;
mod warehouses;

pub use auth::{login, logout, register};
pub use health_check::{health_check, hello};
pub use list::list_records;
pub use products::{create_product, delete_product, get_product};
pub use stock::{stock, unstock};
pub use warehouses::{create_warehouse, delete_warehouse, get_warehouse};

use crate::error::{AppError, DatabaseError};

/// 404 for a record looked up by id
fn record_not_found(id: &uuid::Uuid) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("Record [{}] not found.", id)))
}

/// Body returned by the delete endpoints
fn deleted() -> serde_json::Value {
    serde_json::json!({ "success": true, "message": "Record deleted." })
}
