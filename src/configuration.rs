use actix_web::cookie::SameSite;

use crate::auth::MIN_PBKDF2_ITERATIONS;
use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub tokens: TokenSettings,
    pub cookies: CookieSettings,
    #[serde(default)]
    pub password: PasswordSettings,
}

/// Session token settings
///
/// The access token must be materially shorter-lived than the refresh token,
/// otherwise the refresh step never has anything to do.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct TokenSettings {
    pub private_key_path: String,
    pub public_key_path: String,
    pub issuer: String,
    pub access_token_ttl_seconds: i64,  // e.g. 1800 for 30 minutes
    pub refresh_token_ttl_seconds: i64, // e.g. 3600 for one hour
    /// Remaining access lifetime under which the gate renews proactively.
    /// Unset means the access TTL, i.e. renew on every authorized request.
    #[serde(default)]
    pub renew_within_seconds: Option<i64>,
}

impl TokenSettings {
    pub fn renewal_window_seconds(&self) -> i64 {
        self.renew_within_seconds
            .unwrap_or(self.access_token_ttl_seconds)
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CookieSettings {
    pub same_site: SameSitePolicy,
    /// Off by default; turn on once the service sits behind TLS.
    #[serde(default)]
    pub secure: bool,
    pub safety_margin_seconds: i64,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    pub iterations: u32,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            iterations: MIN_PBKDF2_ITERATIONS,
        }
    }
}

impl Settings {
    /// Reject orderings and values that would silently weaken the session model
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tokens = &self.auth.tokens;

        if tokens.access_token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.tokens.access_token_ttl_seconds must be positive".to_string(),
            ));
        }
        if tokens.access_token_ttl_seconds >= tokens.refresh_token_ttl_seconds {
            return Err(ConfigError::InvalidValue(format!(
                "access token TTL ({}s) must be shorter than refresh token TTL ({}s)",
                tokens.access_token_ttl_seconds, tokens.refresh_token_ttl_seconds
            )));
        }
        if tokens.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.tokens.issuer".to_string()));
        }

        let cookies = &self.auth.cookies;
        let margin = cookies.safety_margin_seconds;
        if margin < 0 || margin >= tokens.access_token_ttl_seconds {
            return Err(ConfigError::InvalidValue(
                "auth.cookies.safety_margin_seconds must be within [0, access TTL)".to_string(),
            ));
        }
        // The access cookie disappears `margin` seconds before its token expires,
        // so renewal has to start before that or an active session lapses
        if tokens.renewal_window_seconds() <= margin {
            return Err(ConfigError::InvalidValue(format!(
                "auth.tokens.renew_within_seconds ({}s) must exceed auth.cookies.safety_margin_seconds ({}s)",
                tokens.renewal_window_seconds(),
                margin
            )));
        }
        if cookies.same_site == SameSitePolicy::None && !cookies.secure {
            return Err(ConfigError::InvalidValue(
                "auth.cookies.same_site = none requires auth.cookies.secure = true".to_string(),
            ));
        }
        if self.auth.password.iterations < MIN_PBKDF2_ITERATIONS {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password.iterations must be at least {}",
                MIN_PBKDF2_ITERATIONS
            )));
        }

        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
