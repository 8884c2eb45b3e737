/// Asymmetric signing keys
///
/// One RS256 keypair, loaded once at startup and handed to `TokenService`.
/// Verification only needs the public half.

use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fs;
use std::path::Path;

use crate::configuration::TokenSettings;
use crate::error::ConfigError;

#[derive(Clone)]
pub struct SigningKeys {
    pub(crate) encoding: EncodingKey,
    pub(crate) decoding: DecodingKey,
}

impl SigningKeys {
    /// Build from PEM-encoded RSA private and public keys
    ///
    /// # Errors
    /// Returns `ConfigError::ParseError` if either key is not valid RSA PEM
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, ConfigError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| ConfigError::ParseError(format!("invalid RSA private key: {}", e)))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| ConfigError::ParseError(format!("invalid RSA public key: {}", e)))?;

        Ok(Self { encoding, decoding })
    }

    /// Read both key files named in the token settings
    pub fn from_settings(settings: &TokenSettings) -> Result<Self, ConfigError> {
        let private_pem = read_key(&settings.private_key_path)?;
        let public_pem = read_key(&settings.public_key_path)?;
        Self::from_pem(&private_pem, &public_pem)
    }
}

fn read_key(path: impl AsRef<Path>) -> Result<Vec<u8>, ConfigError> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| {
        ConfigError::MissingRequired(format!("cannot read key file {}: {}", path.display(), e))
    })
}
