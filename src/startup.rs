use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::Authenticator;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::SessionGate;
use crate::routes::{
    create_product, create_warehouse, delete_product, delete_warehouse, get_product,
    get_warehouse, health_check, hello, list_records, login, logout, register, stock, unstock,
};

const MAX_JSON_BODY: usize = 64 * 1024;

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    authenticator: Authenticator,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let authenticator = web::Data::new(authenticator);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging

            // Shared state
            .app_data(connection.clone())
            .app_data(authenticator.clone())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())

            // Public routes
            .route("/", web::get().to(hello))
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))

            // Everything else requires a session
            .service(
                web::scope("")
                    .wrap(SessionGate::new(authenticator.clone()))
                    .route("/list/{model}", web::get().to(list_records))
                    .route("/product", web::post().to(create_product))
                    .service(
                        web::resource("/product/{id}")
                            .route(web::get().to(get_product))
                            .route(web::delete().to(delete_product)),
                    )
                    .route("/warehouse", web::post().to(create_warehouse))
                    .service(
                        web::resource("/warehouse/{id}")
                            .route(web::get().to(get_warehouse))
                            .route(web::delete().to(delete_warehouse)),
                    )
                    .route("/stock", web::post().to(stock))
                    .route("/unstock", web::post().to(unstock)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Malformed JSON bodies answer with the usual error payload instead of plain text
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| {
            tracing::warn!("Rejected request body: {}", err);
            AppError::Validation(ValidationError::InvalidFormat("body")).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        tracing::warn!("Rejected query string: {}", err);
        AppError::Validation(ValidationError::InvalidFormat("query")).into()
    })
}

/// Unparseable ids in `/product/{id}` and `/warehouse/{id}`
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        tracing::warn!("Rejected path {}: {}", req.path(), err);
        AppError::Validation(ValidationError::InvalidFormat("id")).into()
    })
}
