/// Session Token Issuance and Verification
///
/// Access and refresh tokens are both RS256-signed JWTs that differ only in
/// their `kind` claim and lifetime. Refresh tokens exist solely to mint new
/// access tokens; rotation hands back the same refresh token it was given.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use sha2::{Digest, Sha256};
use std::error::Error as StdError;
use std::fmt;

use crate::auth::claims::{Claims, SessionUser, TokenKind};
use crate::auth::keys::SigningKeys;
use crate::configuration::TokenSettings;

/// Token-level failures
///
/// These never reach a route handler; the authorization gate collapses them
/// into `AuthError::Unauthenticated`.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenError {
    /// Signature is valid but the token is past `exp`
    Expired,
    /// Bad signature, malformed token, wrong issuer or wrong kind
    Invalid,
    /// Refresh token missing, expired or not verifiable
    RefreshInvalid,
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::RefreshInvalid => write!(f, "Refresh token is missing or invalid"),
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// A signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }
}

/// Access + refresh tokens issued or renewed together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Clone)]
pub struct TokenService {
    keys: SigningKeys,
    issuer: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(keys: SigningKeys, settings: &TokenSettings) -> Self {
        Self {
            keys,
            issuer: settings.issuer.clone(),
            access_ttl_seconds: settings.access_token_ttl_seconds,
            refresh_ttl_seconds: settings.refresh_token_ttl_seconds,
        }
    }

    pub fn issue_access_token(&self, user: &SessionUser) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, TokenKind::Access, Utc::now().timestamp())
    }

    pub fn issue_refresh_token(&self, user: &SessionUser) -> Result<IssuedToken, TokenError> {
        self.issue_at(user, TokenKind::Refresh, Utc::now().timestamp())
    }

    /// Issue a fresh access + refresh pair, as done at login
    pub fn issue_pair(&self, user: &SessionUser) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(user, Utc::now().timestamp())
    }

    pub fn issue_pair_at(&self, user: &SessionUser, now: i64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_at(user, TokenKind::Access, now)?,
            refresh: self.issue_at(user, TokenKind::Refresh, now)?,
        })
    }

    /// Sign a token of the given kind as if issued at `now` (Unix seconds)
    pub fn issue_at(
        &self,
        user: &SessionUser,
        kind: TokenKind,
        now: i64,
    ) -> Result<IssuedToken, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_seconds,
            TokenKind::Refresh => self.refresh_ttl_seconds,
        };
        let claims = Claims::new(user.clone(), kind, now, ttl, self.issuer.clone());

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature, issuer, kind and expiry of a token
    ///
    /// # Errors
    /// - `TokenError::Expired` if the signature checks out but `exp` has passed
    /// - `TokenError::Invalid` for anything else
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, expected: TokenKind, now: i64) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        // Expiry is checked below against the caller's clock with zero leeway
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(
                    kind = expected.as_str(),
                    token = %fingerprint(token),
                    "JWT decode error: {}", e
                );
                TokenError::Invalid
            })?;

        if claims.kind != expected {
            tracing::warn!(
                expected = expected.as_str(),
                presented = claims.kind.as_str(),
                "Token presented as the wrong kind"
            );
            return Err(TokenError::Invalid);
        }

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Mint a new access token from a refresh token
    ///
    /// The returned pair holds the new access token and the *same* refresh token.
    pub fn rotate_access_token(&self, refresh_token: Option<&str>) -> Result<TokenPair, TokenError> {
        self.rotate_access_token_at(refresh_token, Utc::now().timestamp())
    }

    pub fn rotate_access_token_at(
        &self,
        refresh_token: Option<&str>,
        now: i64,
    ) -> Result<TokenPair, TokenError> {
        let refresh_token = refresh_token.ok_or(TokenError::RefreshInvalid)?;

        let refresh_claims = self
            .verify_at(refresh_token, TokenKind::Refresh, now)
            .map_err(|e| {
                tracing::info!(
                    token = %fingerprint(refresh_token),
                    reason = %e,
                    "Refresh token rejected"
                );
                TokenError::RefreshInvalid
            })?;

        let access = self.issue_at(&refresh_claims.user, TokenKind::Access, now)?;

        Ok(TokenPair {
            access,
            refresh: IssuedToken {
                token: refresh_token.to_string(),
                claims: refresh_claims,
            },
        })
    }
}

/// Short SHA-256 fingerprint so tokens can be correlated in logs without being leaked
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
