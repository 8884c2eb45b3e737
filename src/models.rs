/// Inventory records
///
/// Row types read with `sqlx::FromRow` plus the request/response shapes built
/// from them. JSON uses camelCase keys, except stock adjustment bodies which
/// keep the `warehouse_id` / `product_id` / `qty` keys clients already send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Credential, SessionUser};

/// Full user row, including credential columns
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn credential(&self) -> Credential {
        Credential {
            identity: self.email.clone(),
            password_hash: self.password_hash.clone(),
            salt: self.salt.clone(),
        }
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser::new(self.email.clone(), self.first_name.clone())
    }

    /// Everything except the credential columns
    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User as returned to callers; has no password hash or salt by construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    pub address: String,
}

/// Quantity of one product held in one warehouse
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub qty: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `/stock` and `/unstock`
#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub qty: f64,
}

/// Resources reachable through `/list/{model}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Product,
    Warehouse,
    Stock,
}

impl std::str::FromStr for Model {
    type Err = crate::error::ValidationError;

    /// Users are deliberately not listable
    fn from_str(model: &str) -> Result<Self, Self::Err> {
        match model.to_ascii_lowercase().as_str() {
            "product" => Ok(Model::Product),
            "warehouse" => Ok(Model::Warehouse),
            "stock" => Ok(Model::Stock),
            _ => Err(crate::error::ValidationError::UnknownModel(model.to_string())),
        }
    }
}
