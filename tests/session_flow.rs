//! Register → login → authorize → logout without a database
//!
//! Account rows are built in memory from the credential the authenticator
//! derives, exactly as the `/register` handler would persist them.

use actix_web::cookie::Cookie;
use chrono::Utc;
use serde_json::json;
use stockroom::auth::{
    Authenticator, CookiePair, CredentialStore, SessionCookies, SessionUser, SigningKeys,
    TokenKind, TokenService,
};
use stockroom::configuration::{AuthSettings, CookieSettings, SameSitePolicy, TokenSettings};
use stockroom::error::{AppError, AuthError};
use stockroom::models::UserAccount;
use uuid::Uuid;

const PRIVATE_PEM: &[u8] = include_bytes!("fixtures/token_signing.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("fixtures/token_verifying.pem");
const ACCESS_TTL: i64 = 1800;
const REFRESH_TTL: i64 = 3600;
const RENEW_WITHIN: i64 = 300;
const T0: i64 = 1_700_000_000;

fn authenticator() -> Authenticator {
    let settings = TokenSettings {
        private_key_path: String::new(),
        public_key_path: String::new(),
        issuer: "stockroom-test".to_string(),
        access_token_ttl_seconds: ACCESS_TTL,
        refresh_token_ttl_seconds: REFRESH_TTL,
        renew_within_seconds: None,
    };
    let keys = SigningKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM).expect("fixture keys");

    Authenticator::new(
        TokenService::new(keys, &settings),
        SessionCookies::new(&CookieSettings {
            same_site: SameSitePolicy::Strict,
            secure: false,
            safety_margin_seconds: 1,
        }),
        CredentialStore::default(),
        RENEW_WITHIN,
    )
}

/// Authenticator built the way `main` builds it, from deserialized settings
fn configured_authenticator(renew_within_seconds: Option<i64>) -> Authenticator {
    let mut tokens = json!({
        "private_key_path": "unused.pem",
        "public_key_path": "unused.pem",
        "issuer": "stockroom-test",
        "access_token_ttl_seconds": ACCESS_TTL,
        "refresh_token_ttl_seconds": REFRESH_TTL
    });
    if let Some(window) = renew_within_seconds {
        tokens["renew_within_seconds"] = json!(window);
    }
    let settings: AuthSettings = serde_json::from_value(json!({
        "tokens": tokens,
        "cookies": { "same_site": "strict", "safety_margin_seconds": 1 }
    }))
    .expect("auth settings");
    let keys = SigningKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM).expect("fixture keys");

    Authenticator::from_settings(keys, &settings)
}

/// Browser-style jar: a cookie is sent only until its expiry
#[derive(Default)]
struct CookieJar {
    access: Option<(String, i64)>,
    refresh: Option<(String, i64)>,
}

impl CookieJar {
    fn store(&mut self, cookies: &CookiePair) {
        self.access = stored(&cookies.access);
        self.refresh = stored(&cookies.refresh);
    }

    fn access_at(&self, now: i64) -> Option<&str> {
        live(&self.access, now)
    }

    fn refresh_at(&self, now: i64) -> Option<&str> {
        live(&self.refresh, now)
    }
}

fn stored(cookie: &Cookie<'static>) -> Option<(String, i64)> {
    let expires = cookie.expires_datetime()?.unix_timestamp();
    Some((cookie.value().to_string(), expires))
}

fn live(entry: &Option<(String, i64)>, now: i64) -> Option<&str> {
    entry
        .as_ref()
        .filter(|(_, expires)| now < *expires)
        .map(|(value, _)| value.as_str())
}

fn signed_in_jar(auth: &Authenticator) -> CookieJar {
    let pair = auth
        .tokens()
        .issue_pair_at(&SessionUser::new("a@x.com", "Ada"), T0)
        .unwrap();
    let mut jar = CookieJar::default();
    jar.store(&auth.cookies().to_cookies(&pair));
    jar
}

async fn register(auth: &Authenticator, email: &str, password: &str) -> UserAccount {
    let credential = auth.create_credential(email, password).await.unwrap();
    UserAccount {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: None,
        password_hash: credential.password_hash,
        salt: credential.salt,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[actix_web::test]
async fn login_with_registered_credentials_sets_both_cookies() {
    let auth = authenticator();
    let account = register(&auth, "a@x.com", "p1").await;

    let session = auth.login("a@x.com", "p1", Some(account)).await.unwrap();

    let profile = serde_json::to_value(&session.profile).unwrap();
    assert_eq!(profile["email"], "a@x.com");
    assert!(profile.get("passwordHash").is_none());
    assert!(profile.get("salt").is_none());

    assert_eq!(session.cookies.access.name(), "access");
    assert_eq!(session.cookies.refresh.name(), "refresh");
    assert!(!session.cookies.access.value().is_empty());
    assert!(!session.cookies.refresh.value().is_empty());
    assert_eq!(session.cookies.access.http_only(), Some(true));
}

#[actix_web::test]
async fn expired_access_is_renewed_while_refresh_is_valid() {
    let auth = authenticator();
    let account = register(&auth, "a@x.com", "p1").await;
    let session = auth.login("a@x.com", "p1", Some(account)).await.unwrap();
    let access = session.cookies.access.value().to_string();
    let refresh = session.cookies.refresh.value().to_string();

    let later = Utc::now().timestamp() + ACCESS_TTL + 5;
    let outcome = auth
        .authorize_at(Some(&access), Some(&refresh), later)
        .expect("refresh token is still valid");

    assert_eq!(outcome.user.email, "a@x.com");
    let renewed = outcome.renewed.expect("renewed cookies");
    assert_ne!(renewed.access.value(), access);
    assert_eq!(renewed.refresh.value(), refresh);

    let claims = auth
        .tokens()
        .verify_at(renewed.access.value(), TokenKind::Access, later)
        .unwrap();
    assert_eq!(claims.exp, later + ACCESS_TTL);
    let refresh_claims = auth
        .tokens()
        .verify_at(renewed.refresh.value(), TokenKind::Refresh, later)
        .unwrap();
    assert_eq!(refresh_claims.user.email, "a@x.com");
}

#[actix_web::test]
async fn session_past_refresh_ttl_is_rejected_and_cleared() {
    let auth = authenticator();
    let account = register(&auth, "a@x.com", "p1").await;
    let session = auth.login("a@x.com", "p1", Some(account)).await.unwrap();

    let much_later = Utc::now().timestamp() + REFRESH_TTL + 100;
    let rejection = auth
        .authorize_at(
            Some(session.cookies.access.value()),
            Some(session.cookies.refresh.value()),
            much_later,
        )
        .unwrap_err();

    assert_eq!(rejection.error(), AuthError::Unauthenticated);
    assert_eq!(rejection.cleared.access.value(), "");
    assert_eq!(rejection.cleared.refresh.value(), "");
}

#[actix_web::test]
async fn wrong_password_is_invalid_credentials() {
    let auth = authenticator();
    let account = register(&auth, "a@x.com", "p1").await;

    let result = auth.login("a@x.com", "p2", Some(account)).await;

    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::InvalidCredentials))
    ));
}

#[actix_web::test]
async fn unknown_account_is_account_not_found() {
    let auth = authenticator();

    let result = auth.login("nobody@x.com", "p1", None).await;

    assert!(matches!(result, Err(AppError::Auth(AuthError::AccountNotFound))));
}

#[actix_web::test]
async fn logout_then_authorize_is_rejected() {
    let auth = authenticator();
    let cleared = auth.logout();

    let result = auth.authorize(Some(cleared.access.value()), Some(cleared.refresh.value()));

    assert!(result.is_err());
}

#[test]
fn active_session_outlives_access_ttl_with_default_window() {
    let auth = configured_authenticator(None);
    let mut jar = signed_in_jar(&auth);
    let mut renewals = 0;

    // One request every ten minutes until just before the refresh token expires
    let mut now = T0;
    while now + 600 < T0 + REFRESH_TTL {
        now += 600;
        let outcome = auth
            .authorize_at(jar.access_at(now), jar.refresh_at(now), now)
            .unwrap_or_else(|r| panic!("rejected {}s after login: {}", now - T0, r.reason));
        if let Some(cookies) = outcome.renewed {
            jar.store(&cookies);
            renewals += 1;
        }
    }

    assert_eq!(renewals, 5);
    assert!(jar.access_at(T0 + ACCESS_TTL).is_some());
}

#[test]
fn narrow_window_renews_before_access_cookie_expires() {
    let auth = configured_authenticator(Some(RENEW_WITHIN));
    let mut jar = signed_in_jar(&auth);

    let early = T0 + 600;
    let outcome = auth
        .authorize_at(jar.access_at(early), jar.refresh_at(early), early)
        .unwrap();
    assert!(outcome.renewed.is_none());

    let near_expiry = T0 + ACCESS_TTL - 60;
    let outcome = auth
        .authorize_at(jar.access_at(near_expiry), jar.refresh_at(near_expiry), near_expiry)
        .unwrap();
    jar.store(&outcome.renewed.expect("renewed inside the window"));

    let past_first_ttl = T0 + ACCESS_TTL + 600;
    assert!(auth
        .authorize_at(
            jar.access_at(past_first_ttl),
            jar.refresh_at(past_first_ttl),
            past_first_ttl
        )
        .is_ok());
}

#[test]
fn refresh_cookie_alone_does_not_authorize() {
    let auth = configured_authenticator(Some(RENEW_WITHIN));
    let jar = signed_in_jar(&auth);

    // Idle past the access cookie's expiry: the browser only sends `refresh`
    let idle = T0 + ACCESS_TTL + 60;
    assert!(jar.access_at(idle).is_none());
    assert!(jar.refresh_at(idle).is_some());

    let rejection = auth.authorize_at(None, jar.refresh_at(idle), idle).unwrap_err();
    assert_eq!(rejection.cleared.refresh.value(), "");
}
