/// Authentication Routes
///
/// Account registration, login and logout. Sessions live entirely in the
/// `access` / `refresh` cookies; nothing here touches a session table.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{AuditLog, AuditStatus};
use crate::auth::Authenticator;
use crate::error::{is_unique_violation, AppError, AuthError, ValidationError};
use crate::models::UserAccount;
use crate::validators::{is_valid_email, is_valid_name, validate_password};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password_hash, salt, created_at, updated_at";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password: String,
}

/// Both fields are optional at the JSON level so a missing one reads as a
/// validation error rather than a malformed body
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /register
///
/// Creates an account and returns its public profile. Does not sign the user in.
///
/// # Errors
/// - 400: invalid email, name or empty password
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    auth: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let first_name = is_valid_name("firstName", &form.first_name)?;
    let last_name = form
        .last_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(|name| is_valid_name("lastName", name))
        .transpose()?;
    validate_password(&form.password)?;

    let credential = auth.create_credential(&email, &form.password).await?;

    let now = Utc::now();
    let account = sqlx::query_as::<_, UserAccount>(&format!(
        r#"
        INSERT INTO users (id, email, first_name, last_name, password_hash, salt, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&credential.password_hash)
    .bind(&credential.salt)
    .bind(now)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuditLog::new("REGISTER", "user", AuditStatus::Failure, "Email already registered")
                .with_user(&email)
                .record();
            AppError::Auth(AuthError::DuplicateIdentity)
        } else {
            AppError::from(e)
        }
    })?;

    AuditLog::new("REGISTER", "user", AuditStatus::Success, "Account created")
        .with_user(&account.email)
        .with_resource_id(account.id.to_string())
        .record();

    Ok(HttpResponse::Created().json(account.profile()))
}

/// POST /login
///
/// Verifies the password and sets both session cookies.
///
/// # Errors
/// - 400: email or password missing
/// - 401: `Account not found.` / `Invalid password.`
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    auth: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let email = form
        .email
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::EmptyField("email"))?;
    let password = form
        .password
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::EmptyField("password"))?;
    let email = is_valid_email(email)?;

    let account = sqlx::query_as::<_, UserAccount>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let session = auth.login(&email, password, account).await?;

    let mut response = HttpResponse::Ok();
    session.cookies.apply(&mut response);
    Ok(response.json(session.profile))
}

/// POST /logout
///
/// Always succeeds, signed in or not.
pub async fn logout(auth: web::Data<Authenticator>) -> HttpResponse {
    let cleared = auth.logout();

    let mut response = HttpResponse::Ok();
    cleared.apply(&mut response);
    response.json(serde_json::json!({ "success": true }))
}
