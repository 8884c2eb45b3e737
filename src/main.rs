use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use stockroom::auth::{Authenticator, SigningKeys};
use stockroom::configuration::get_configuration;
use stockroom::startup::run;
use stockroom::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry("info");

    tracing::info!("Starting application");

    // 설정 로드 및 검증
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // 토큰 서명 키 로드
    let keys = SigningKeys::from_settings(&configuration.auth.tokens).map_err(|e| {
        tracing::error!("Failed to load token signing keys: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Signing key error")
    })?;
    let authenticator = Authenticator::from_settings(keys, &configuration.auth);

    // 데이터베이스 연결 풀 생성
    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;

    tracing::info!("Database connection pool created successfully");

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;

    // 서버 실행
    let server = run(listener, pool, authenticator)?;
    tracing::info!("Server started successfully");

    server.await
}
