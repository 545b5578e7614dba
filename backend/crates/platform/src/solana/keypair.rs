//! Platform signing keypair

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use thiserror::Error;

use super::pubkey::Pubkey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeypairError {
    #[error("Keypair secret is empty")]
    Empty,

    #[error("Keypair secret is neither base58 nor a JSON byte array")]
    InvalidEncoding,

    #[error("Keypair must be 64 bytes, got {0}")]
    WrongLength(usize),

    #[error("Keypair public half does not match its secret half")]
    Mismatch,
}

/// Ed25519 keypair in the 64-byte `secret || public` layout used by Solana
/// wallets and the CLI
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn from_signing_key(signing: SigningKey) -> Self {
        Self { signing }
    }

    /// Generate a fresh keypair
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| KeypairError::WrongLength(bytes.len()))?;
        let signing = SigningKey::from_keypair_bytes(&array).map_err(|_| KeypairError::Mismatch)?;
        Ok(Self { signing })
    }

    /// Parse either a base58 string or a JSON byte array (`solana-keygen` file
    /// contents)
    pub fn from_secret_str(secret: &str) -> Result<Self, KeypairError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(KeypairError::Empty);
        }

        let bytes = if secret.starts_with('[') {
            serde_json::from_str::<Vec<u8>>(secret).map_err(|_| KeypairError::InvalidEncoding)?
        } else {
            bs58::decode(secret)
                .into_vec()
                .map_err(|_| KeypairError::InvalidEncoding)?
        };
        Self::from_bytes(&bytes)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing.verifying_key().to_bytes())
    }

    pub fn sign_message(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.signing.to_keypair_bytes()).into_string()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
