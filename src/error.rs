/// Application Error Handling
///
/// One error type (`AppError`) flows through every route handler. It is built from
/// small domain enums so each failure keeps its own meaning until it is rendered:
/// 1. Domain-specific error types (validation, database, auth, inventory, config)
/// 2. `From` conversions so handlers can use `?`
/// 3. HTTP response mapping with structured logging

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// SQLSTATE codes we classify explicitly
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
    OutOfRange(&'static str),
    UnknownModel(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::OutOfRange(field) => write!(f, "{} is out of range", field),
            ValidationError::UnknownModel(model) => write!(f, "Invalid Request: unknown model '{}'", model),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            DatabaseError::NotFound(msg) => write!(f, "{}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Authentication and session errors as seen by handlers
///
/// Token-level failures (`TokenError`) are collapsed into `Unauthenticated`
/// before they get here.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    DuplicateIdentity,
    InvalidCredentials,
    AccountNotFound,
    Unauthenticated,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::DuplicateIdentity => write!(f, "Email already registered."),
            AuthError::InvalidCredentials => write!(f, "Invalid password."),
            AuthError::AccountNotFound => write!(f, "Account not found."),
            AuthError::Unauthenticated => write!(f, "Please login to proceed."),
        }
    }
}

impl StdError for AuthError {}

/// Stock adjustment errors
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryError {
    NoStock,
    InsufficientQuantity { available: f64, requested: f64 },
    UnknownProductOrWarehouse,
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryError::NoStock => write!(f, "No stock quantity to deduct."),
            InventoryError::InsufficientQuantity { available, requested } => write!(
                f,
                "Not enough stock quantity to deduct (available {}, requested {}).",
                available, requested
            ),
            InventoryError::UnknownProductOrWarehouse => {
                write!(f, "Product or warehouse not found.")
            }
        }
    }
}

impl StdError for InventoryError {}

/// Configuration and startup errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Inventory(InventoryError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Inventory(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        AppError::Inventory(err)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("Record not found.".to_string()))
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ if is_unique_violation(&err) => AppError::Database(
                DatabaseError::UniqueConstraintViolation("record already exists".to_string()),
            ),
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

/// True when the database rejected a write because of a UNIQUE constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// True when the database rejected a write because a referenced row is missing
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error payload returned to callers
///
/// `error` carries the human-readable description.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Error code for client-side handling
    pub code: String,
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, error: String, code: String, status: u16) -> Self {
        Self {
            error,
            code,
            error_id,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Machine-readable code paired with the status
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(ValidationError::UnknownModel(_)) => "INVALID_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => "DUPLICATE_ENTRY",
            AppError::Database(DatabaseError::NotFound(_)) => "NOT_FOUND",
            AppError::Database(DatabaseError::ConnectionPool(_)) => "SERVICE_UNAVAILABLE",
            AppError::Database(DatabaseError::UnexpectedError(_)) => "DATABASE_ERROR",
            AppError::Auth(AuthError::DuplicateIdentity) => "DUPLICATE_IDENTITY",
            AppError::Auth(AuthError::InvalidCredentials) => "INVALID_CREDENTIALS",
            AppError::Auth(AuthError::AccountNotFound) => "ACCOUNT_NOT_FOUND",
            AppError::Auth(AuthError::Unauthenticated) => "UNAUTHENTICATED",
            AppError::Inventory(InventoryError::UnknownProductOrWarehouse) => "NOT_FOUND",
            AppError::Inventory(InventoryError::NoStock) => "NO_STOCK",
            AppError::Inventory(InventoryError::InsufficientQuantity { .. }) => {
                "INSUFFICIENT_QUANTITY"
            }
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the caller; server-side details stay in the logs
    fn public_message(&self) -> String {
        match self {
            AppError::Database(DatabaseError::ConnectionPool(_)) => {
                "Database service temporarily unavailable".to_string()
            }
            AppError::Database(DatabaseError::UnexpectedError(_)) => {
                "Database error occurred".to_string()
            }
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(error_id = error_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(DatabaseError::NotFound(_)) => {
                tracing::info!(error_id = error_id, error = %self, "Record not found");
            }
            AppError::Database(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::Inventory(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Stock adjustment rejected");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::DuplicateIdentity => StatusCode::CONFLICT,
                AuthError::InvalidCredentials
                | AuthError::AccountNotFound
                | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            },
            AppError::Inventory(e) => match e {
                InventoryError::UnknownProductOrWarehouse => StatusCode::NOT_FOUND,
                InventoryError::NoStock | InventoryError::InsufficientQuantity { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = ValidationError::InvalidFormat("email").into();
        assert!(matches!(app_err, AppError::Validation(_)));
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            AppError::Auth(AuthError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::DuplicateIdentity).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_inventory_status_codes() {
        let err = AppError::Inventory(InventoryError::InsufficientQuantity {
            available: 1.0,
            requested: 2.0,
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INSUFFICIENT_QUANTITY");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Internal("key file unreadable".to_string());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::new(
            "test-123".to_string(),
            "Please login to proceed.".to_string(),
            "UNAUTHENTICATED".to_string(),
            401,
        );

        assert_eq!(response.error_id, "test-123");
        assert_eq!(response.error, "Please login to proceed.");
        assert_eq!(response.status, 401);
    }
}
