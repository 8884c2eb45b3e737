/// Session token claims
///
/// Payload carried by both access and refresh tokens. The `user` object is the
/// only identity information embedded; password hash and salt never appear here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal identity embedded in every session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: String,
    pub first_name: String,
}

impl SessionUser {
    pub fn new(email: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
        }
    }
}

/// Which class of token a JWT is; the two are never interchangeable
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user: SessionUser,
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    /// Unique per issuance so two tokens minted in the same second differ
    pub jti: String,
}

impl Claims {
    pub fn new(
        user: SessionUser,
        kind: TokenKind,
        issued_at: i64,
        ttl_seconds: i64,
        issuer: String,
    ) -> Self {
        Self {
            user,
            kind,
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Expired once `now` reaches `exp`; valid at every instant strictly before it
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    pub fn seconds_remaining_at(&self, now: i64) -> i64 {
        self.exp - now
    }
}
