/// Password Credential Derivation and Verification
///
/// Passwords are stretched with PBKDF2-HMAC-SHA512 over a random per-record
/// salt. The salt is stored hex-encoded and its hex text is what feeds the KDF,
/// so records written by the previous Node.js deployment keep verifying.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::pbkdf2;
use std::num::NonZeroU32;

/// Floor for the work factor; configuration may raise it, never lower it
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;
/// Derived key length in bytes (hex-encoded on storage)
pub const CREDENTIAL_LEN: usize = 512;
/// Random salt length in bytes before hex encoding
pub const SALT_LEN: usize = 16;

/// Derived credential ready to be persisted with the user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub password_hash: String,
    pub salt: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    iterations: NonZeroU32,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(MIN_PBKDF2_ITERATIONS)
    }
}

impl CredentialStore {
    /// Iteration counts below `MIN_PBKDF2_ITERATIONS` are raised to the floor
    pub fn new(iterations: u32) -> Self {
        let iterations = NonZeroU32::new(iterations.max(MIN_PBKDF2_ITERATIONS))
            .unwrap_or(NonZeroU32::MIN);
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Derive a new credential with a freshly generated salt
    ///
    /// CPU heavy by design; call from a blocking context.
    pub fn create_credential(&self, identity: &str, password: &str) -> Credential {
        let salt = generate_salt();
        let derived = self.derive(password, &salt);

        Credential {
            identity: identity.to_string(),
            password_hash: hex::encode(derived),
            salt,
        }
    }

    /// Recompute the hash with the stored salt and compare in constant time
    ///
    /// A stored hash that is not valid hex never verifies.
    pub fn verify_credential(&self, identity: &str, password: &str, stored: &Credential) -> bool {
        if identity != stored.identity {
            return false;
        }

        let expected = match hex::decode(&stored.password_hash) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                tracing::warn!(identity = %identity, "Stored password hash is malformed");
                return false;
            }
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA512,
            self.iterations,
            stored.salt.as_bytes(),
            password.as_bytes(),
            &expected,
        )
        .is_ok()
    }

    fn derive(&self, password: &str, salt: &str) -> [u8; CREDENTIAL_LEN] {
        let mut out = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA512,
            self.iterations,
            salt.as_bytes(),
            password.as_bytes(),
            &mut out,
        );
        out
    }
}

fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}
