/// Session Lifecycle
///
/// Ties credentials, tokens and cookies together behind the four boundary
/// calls used by the HTTP layer: credential creation for `register`, `login`,
/// `authorize` (the per-request gate) and `logout`.

use actix_web::{web, HttpResponse, ResponseError};
use chrono::Utc;

use crate::audit::{AuditLog, AuditStatus};
use crate::auth::claims::{SessionUser, TokenKind};
use crate::auth::cookies::{CookiePair, SessionCookies};
use crate::auth::keys::SigningKeys;
use crate::auth::password::{Credential, CredentialStore};
use crate::auth::tokens::{fingerprint, TokenError, TokenService};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::models::{PublicProfile, UserAccount};

/// Outcome of a successful login
#[derive(Debug)]
pub struct Session {
    pub profile: PublicProfile,
    pub cookies: CookiePair,
}

/// Outcome of a successful authorization
#[derive(Debug)]
pub struct Authorization {
    pub user: SessionUser,
    /// Cookies to send back when the session was renewed on this request
    pub renewed: Option<CookiePair>,
}

/// Outcome of a failed authorization
///
/// Always `Unauthenticated` to the caller; `reason` is for the logs only.
#[derive(Debug)]
pub struct Rejection {
    pub reason: &'static str,
    pub cleared: CookiePair,
}

impl Rejection {
    pub fn error(&self) -> AuthError {
        AuthError::Unauthenticated
    }

    /// 401 response carrying the removal cookies
    pub fn into_response(self) -> HttpResponse {
        let mut response = AppError::Auth(self.error()).error_response();
        self.cleared.write_to(&mut response);
        response
    }
}

pub struct Authenticator {
    tokens: TokenService,
    cookies: SessionCookies,
    credentials: CredentialStore,
    renew_within_seconds: i64,
}

impl Authenticator {
    pub fn new(
        tokens: TokenService,
        cookies: SessionCookies,
        credentials: CredentialStore,
        renew_within_seconds: i64,
    ) -> Self {
        Self {
            tokens,
            cookies,
            credentials,
            renew_within_seconds,
        }
    }

    pub fn from_settings(keys: SigningKeys, settings: &AuthSettings) -> Self {
        Self::new(
            TokenService::new(keys, &settings.tokens),
            SessionCookies::new(&settings.cookies),
            CredentialStore::new(settings.password.iterations),
            settings.tokens.renewal_window_seconds(),
        )
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    /// Derive a credential for a new account on the blocking pool
    ///
    /// Persisting it (and surfacing `DuplicateIdentity`) is the caller's job.
    pub async fn create_credential(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<Credential, AppError> {
        let store = self.credentials;
        let identity = identity.to_string();
        let password = password.to_string();

        let credential =
            web::block(move || store.create_credential(&identity, &password)).await?;
        Ok(credential)
    }

    /// Check a password against the looked-up account and open a session
    ///
    /// # Errors
    /// - `AuthError::AccountNotFound` when no account exists for `identity`
    /// - `AuthError::InvalidCredentials` when the password does not match
    pub async fn login(
        &self,
        identity: &str,
        password: &str,
        account: Option<UserAccount>,
    ) -> Result<Session, AppError> {
        let account = match account {
            Some(account) => account,
            None => {
                AuditLog::new("LOGIN", "session", AuditStatus::Failure, "Account not found")
                    .with_user(identity)
                    .record();
                return Err(AuthError::AccountNotFound.into());
            }
        };

        let store = self.credentials;
        let stored = account.credential();
        let identity_owned = identity.to_string();
        let password = password.to_string();
        let verified = web::block(move || {
            store.verify_credential(&identity_owned, &password, &stored)
        })
        .await?;

        if !verified {
            AuditLog::new("LOGIN", "session", AuditStatus::Failure, "Password mismatch")
                .with_user(identity)
                .record();
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self
            .tokens
            .issue_pair(&account.session_user())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        AuditLog::new("LOGIN", "session", AuditStatus::Success, "Session opened")
            .with_user(identity)
            .with_resource_id(fingerprint(&pair.refresh.token))
            .record();

        Ok(Session {
            profile: account.profile(),
            cookies: self.cookies.to_cookies(&pair),
        })
    }

    /// Authorize a request from its `access` and `refresh` cookie values
    pub fn authorize(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> Result<Authorization, Rejection> {
        self.authorize_at(access, refresh, Utc::now().timestamp())
    }

    pub fn authorize_at(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
        now: i64,
    ) -> Result<Authorization, Rejection> {
        let access = access
            .filter(|token| !token.is_empty())
            .ok_or_else(|| self.reject("missing access cookie"))?;
        let refresh = refresh.filter(|token| !token.is_empty());

        match self.tokens.verify_at(access, TokenKind::Access, now) {
            Ok(claims) => {
                // Sliding expiry: renew ahead of time instead of on every call
                let renewed = if claims.seconds_remaining_at(now) <= self.renew_within_seconds {
                    self.renew(refresh, now)
                } else {
                    None
                };
                Ok(Authorization {
                    user: claims.user,
                    renewed,
                })
            }
            Err(TokenError::Expired) => {
                let pair = self
                    .tokens
                    .rotate_access_token_at(refresh, now)
                    .map_err(|e| self.reject(rejection_reason(&e)))?;

                AuditLog::new("RENEW", "session", AuditStatus::Success, "Access token renewed")
                    .with_user(&pair.refresh.claims.user.email)
                    .with_resource_id(fingerprint(&pair.refresh.token))
                    .record();

                Ok(Authorization {
                    user: pair.refresh.claims.user.clone(),
                    renewed: Some(self.cookies.to_cookies(&pair)),
                })
            }
            Err(e) => Err(self.reject(rejection_reason(&e))),
        }
    }

    /// Cookies that end the session
    pub fn logout(&self) -> CookiePair {
        AuditLog::new("LOGOUT", "session", AuditStatus::Success, "Session cookies cleared").record();
        self.cookies.clear()
    }

    /// Proactive renewal while the access token is still valid
    ///
    /// The request is already authenticated, so a failure here only skips renewal.
    fn renew(&self, refresh: Option<&str>, now: i64) -> Option<CookiePair> {
        match self.tokens.rotate_access_token_at(refresh, now) {
            Ok(pair) => Some(self.cookies.to_cookies(&pair)),
            Err(e) => {
                tracing::debug!(reason = %e, "Skipping proactive session renewal");
                None
            }
        }
    }

    fn reject(&self, reason: &'static str) -> Rejection {
        AuditLog::new("AUTHORIZE", "session", AuditStatus::Failure, reason).record();
        Rejection {
            reason,
            cleared: self.cookies.clear(),
        }
    }
}

/// Collapse token failures into a log reason; every one of them means "sign in again"
fn rejection_reason(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "access token expired",
        TokenError::Invalid => "access token invalid",
        TokenError::RefreshInvalid => "refresh token missing, expired or invalid",
        TokenError::Signing(_) => "could not sign renewed access token",
    }
}
