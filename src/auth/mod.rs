/// Authentication module
///
/// Password credential derivation, RS256 session tokens, the cookie mapping
/// for them, and the session lifecycle that the authorization gate drives.

mod claims;
mod cookies;
mod keys;
mod password;
mod session;
mod tokens;

pub use claims::{Claims, SessionUser, TokenKind};
pub use cookies::{CookiePair, SessionCookies, ACCESS_COOKIE, REFRESH_COOKIE};
pub use keys::SigningKeys;
pub use password::{Credential, CredentialStore, CREDENTIAL_LEN, MIN_PBKDF2_ITERATIONS, SALT_LEN};
pub use session::{Authenticator, Authorization, Rejection, Session};
pub use tokens::{fingerprint, IssuedToken, TokenError, TokenPair, TokenService};
