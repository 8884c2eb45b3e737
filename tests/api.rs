//! HTTP API against a spawned server and a fresh Postgres database per test
//!
//! Needs the Postgres instance from `configuration.yaml`; run with
//! `cargo test -- --ignored`.

use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use stockroom::auth::{Authenticator, SigningKeys};
use stockroom::configuration::{get_configuration, DatabaseSettings};
use stockroom::startup::run;

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/token_signing.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/token_verifying.pem");

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub client: reqwest::Client,
}

impl TestApp {
    async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn register_and_login(&self) {
        let credentials = json!({
            "email": "a@x.com",
            "firstName": "Ada",
            "password": "p1"
        });
        assert_eq!(201, self.post("/register", &credentials).await.status().as_u16());

        let login = json!({ "email": "a@x.com", "password": "p1" });
        assert_eq!(200, self.post("/login", &login).await.status().as_u16());
    }

    async fn create_product(&self, code: &str) -> String {
        let body = json!({ "code": code, "name": format!("Product {}", code), "price": 9.5 });
        let response = self.post("/product", &body).await;
        assert_eq!(201, response.status().as_u16());
        let product: Value = response.json().await.unwrap();
        product["id"].as_str().unwrap().to_string()
    }

    async fn create_warehouse(&self, name: &str) -> String {
        let body = json!({ "name": name, "address": "1 Dock Road" });
        let response = self.post("/warehouse", &body).await;
        assert_eq!(201, response.status().as_u16());
        let warehouse: Value = response.json().await.unwrap();
        warehouse["id"].as_str().unwrap().to_string()
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let keys = SigningKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM).expect("Failed to load fixture keys");
    let authenticator = Authenticator::from_settings(keys, &configuration.auth);

    let server = run(listener, connection_pool.clone(), authenticator)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
        client: reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap(),
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

// --- Public routes ---

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn root_and_health_check_are_public() {
    let app = spawn_app().await;

    let hello = app.get("/").await;
    assert_eq!(200, hello.status().as_u16());
    assert_eq!("Hello World", hello.text().await.unwrap());

    let health = app.get("/health_check").await;
    assert_eq!(200, health.status().as_u16());
    assert_eq!(Some(0), health.content_length());
}

// --- Registration ---

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_returns_profile_without_credentials() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/register",
            &json!({ "email": "a@x.com", "firstName": "Ada", "lastName": "Lovelace", "password": "p1" }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["email"], "a@x.com");
    assert_eq!(profile["lastName"], "Lovelace");
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("salt").is_none());

    let (hash, salt): (String, String) =
        sqlx::query_as("SELECT password_hash, salt FROM users WHERE email = 'a@x.com'")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch created user");
    assert_eq!(hash.len(), 1024);
    assert_eq!(salt.len(), 32);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_twice_is_conflict() {
    let app = spawn_app().await;
    let body = json!({ "email": "a@x.com", "firstName": "Ada", "password": "p1" });

    assert_eq!(201, app.post("/register", &body).await.status().as_u16());
    let response = app.post("/register", &body).await;

    assert_eq!(409, response.status().as_u16());
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "DUPLICATE_IDENTITY");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_rejects_invalid_input() {
    let app = spawn_app().await;
    let cases = vec![
        (json!({ "email": "not-an-email", "firstName": "Ada", "password": "p1" }), "bad email"),
        (json!({ "email": "a@x.com", "firstName": "", "password": "p1" }), "empty name"),
        (json!({ "email": "a@x.com", "firstName": "Ada", "password": "" }), "empty password"),
        (json!({ "email": "a@x.com" }), "missing fields"),
    ];

    for (body, description) in cases {
        let response = app.post("/register", &body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }
}

// --- Login / logout ---

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn login_sets_http_only_session_cookies() {
    let app = spawn_app().await;
    app.post(
        "/register",
        &json!({ "email": "a@x.com", "firstName": "Ada", "password": "p1" }),
    )
    .await;

    let response = app
        .post("/login", &json!({ "email": "a@x.com", "password": "p1" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let cookies: Vec<_> = response.cookies().collect();
    let access = cookies.iter().find(|c| c.name() == "access").expect("access cookie");
    let refresh = cookies.iter().find(|c| c.name() == "refresh").expect("refresh cookie");
    assert!(access.http_only());
    assert!(refresh.http_only());
    assert!(access.same_site_strict());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn login_failures_are_distinguished() {
    let app = spawn_app().await;
    app.post(
        "/register",
        &json!({ "email": "a@x.com", "firstName": "Ada", "password": "p1" }),
    )
    .await;

    let wrong_password = app
        .post("/login", &json!({ "email": "a@x.com", "password": "p2" }))
        .await;
    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(0, wrong_password.cookies().count());
    let error: Value = wrong_password.json().await.unwrap();
    assert_eq!(error["error"], "Invalid password.");

    let unknown = app
        .post("/login", &json!({ "email": "b@x.com", "password": "p1" }))
        .await;
    assert_eq!(401, unknown.status().as_u16());
    let error: Value = unknown.json().await.unwrap();
    assert_eq!(error["error"], "Account not found.");

    let missing = app.post("/login", &json!({ "email": "a@x.com" })).await;
    assert_eq!(400, missing.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn logout_ends_the_session() {
    let app = spawn_app().await;
    app.register_and_login().await;
    assert_eq!(200, app.get("/list/product").await.status().as_u16());

    let response = app.post("/logout", &json!({})).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let after = app.get("/list/product").await;
    assert_eq!(401, after.status().as_u16());
    let error: Value = after.json().await.unwrap();
    assert_eq!(error["error"], "Please login to proceed.");
}

// --- Inventory ---

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn inventory_routes_require_a_session() {
    let app = spawn_app().await;

    for path in ["/list/product", "/list/warehouse", "/list/stock"] {
        assert_eq!(401, app.get(path).await.status().as_u16(), "GET {}", path);
    }
    let response = app
        .post("/product", &json!({ "code": "A01", "name": "Bolt", "price": 1.0 }))
        .await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn list_rejects_users_and_unknown_models() {
    let app = spawn_app().await;
    app.register_and_login().await;

    assert_eq!(400, app.get("/list/user").await.status().as_u16());
    assert_eq!(400, app.get("/list/invoice").await.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn product_lifecycle() {
    let app = spawn_app().await;
    app.register_and_login().await;

    let id = app.create_product("A01").await;

    let listed: Value = app.get("/list/product?code=A01").await.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let none: Value = app.get("/list/product?code=B02").await.json().await.unwrap();
    assert!(none.as_array().unwrap().is_empty());

    let fetched: Value = app.get(&format!("/product/{}", id)).await.json().await.unwrap();
    assert_eq!(fetched["code"], "A01");

    let duplicate = app
        .post("/product", &json!({ "code": "A01", "name": "Other", "price": 1.0 }))
        .await;
    assert_eq!(409, duplicate.status().as_u16());

    let deleted: Value = app.delete(&format!("/product/{}", id)).await.json().await.unwrap();
    assert_eq!(deleted["message"], "Record deleted.");

    let gone = app.get(&format!("/product/{}", id)).await;
    assert_eq!(404, gone.status().as_u16());
    let error: Value = gone.json().await.unwrap();
    assert_eq!(error["error"], format!("Record [{}] not found.", id));

    let malformed = app.get("/product/not-a-uuid").await;
    assert_eq!(400, malformed.status().as_u16());
    let error: Value = malformed.json().await.unwrap();
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn warehouse_lifecycle() {
    let app = spawn_app().await;
    app.register_and_login().await;

    let id = app.create_warehouse("North").await;
    let fetched: Value = app.get(&format!("/warehouse/{}", id)).await.json().await.unwrap();
    assert_eq!(fetched["name"], "North");

    assert_eq!(200, app.delete(&format!("/warehouse/{}", id)).await.status().as_u16());
    assert_eq!(404, app.delete(&format!("/warehouse/{}", id)).await.status().as_u16());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn stock_and_unstock_adjust_quantity() {
    let app = spawn_app().await;
    app.register_and_login().await;
    let product_id = app.create_product("A01").await;
    let warehouse_id = app.create_warehouse("North").await;
    let adjust = |qty: f64| json!({ "warehouse_id": warehouse_id, "product_id": product_id, "qty": qty });

    let no_stock = app.post("/unstock", &adjust(1.0)).await;
    assert_eq!(422, no_stock.status().as_u16());
    let error: Value = no_stock.json().await.unwrap();
    assert_eq!(error["code"], "NO_STOCK");
    assert_eq!(error["error"], "No stock quantity to deduct.");

    app.post("/stock", &adjust(5.0)).await;
    let level: Value = app.post("/stock", &adjust(2.0)).await.json().await.unwrap();
    assert_eq!(level["qty"], 7.0);

    let level: Value = app.post("/unstock", &adjust(3.0)).await.json().await.unwrap();
    assert_eq!(level["qty"], 4.0);

    let too_much = app.post("/unstock", &adjust(10.0)).await;
    assert_eq!(422, too_much.status().as_u16());
    let error: Value = too_much.json().await.unwrap();
    assert_eq!(error["code"], "INSUFFICIENT_QUANTITY");

    let listed: Value = app
        .get(&format!("/list/stock?warehouse_id={}", warehouse_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed[0]["qty"], 4.0);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn stock_rejects_non_positive_quantities() {
    let app = spawn_app().await;
    app.register_and_login().await;
    let product_id = app.create_product("A01").await;
    let warehouse_id = app.create_warehouse("North").await;

    for qty in [0.0, -1.0] {
        let response = app
            .post(
                "/stock",
                &json!({ "warehouse_id": warehouse_id, "product_id": product_id, "qty": qty }),
            )
            .await;
        assert_eq!(400, response.status().as_u16());
    }
}
