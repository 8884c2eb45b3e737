use actix_web::HttpResponse;

pub async fn hello() -> HttpResponse {
    HttpResponse::Ok().body("Hello World")
}

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().finish()
}
