//! WalletAddress Value Object
//!
//! A Solana wallet address as submitted by the client. Parsing only checks
//! the base58 alphabet and the 32–44 character length; whether the bytes are
//! a valid curve point is left to signature verification.
//!
//! ```rust
//! use auth::domain::value_object::wallet_address::WalletAddress;
//!
//! let wallet = WalletAddress::parse("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").unwrap();
//! assert_eq!(wallet.as_str().len(), 44);
//! assert!(WalletAddress::parse("0xabc").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

pub const MIN_LEN: usize = 32;
pub const MAX_LEN: usize = 44;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> AuthResult<Self> {
        let raw = raw.trim();
        if !(MIN_LEN..=MAX_LEN).contains(&raw.len()) {
            return Err(AuthError::InvalidWalletAddress);
        }
        if !raw.chars().all(|c| BASE58_ALPHABET.contains(c)) {
            return Err(AuthError::InvalidWalletAddress);
        }
        Ok(Self(raw.to_string()))
    }

    /// Rebuild from a stored value without re-validation
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 32-byte public key, when the address decodes to one
    pub fn public_key_bytes(&self) -> Option<[u8; 32]> {
        bs58::decode(&self.0).into_vec().ok()?.try_into().ok()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHANTOM_STYLE: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    #[test]
    fn test_parse_valid() {
        let wallet = WalletAddress::parse(&format!("  {PHANTOM_STYLE} ")).unwrap();
        assert_eq!(wallet.as_str(), PHANTOM_STYLE);
        assert!(wallet.public_key_bytes().is_some());
    }

    #[test]
    fn test_parse_rejects_length() {
        assert!(WalletAddress::parse("").is_err());
        assert!(WalletAddress::parse(&"1".repeat(31)).is_err());
        assert!(WalletAddress::parse(&"1".repeat(45)).is_err());
        assert!(WalletAddress::parse(&"1".repeat(32)).is_ok());
    }

    #[test]
    fn test_parse_rejects_non_base58() {
        // 0, O, I and l are excluded from the alphabet
        for bad in ['0', 'O', 'I', 'l', '+', '/'] {
            let candidate = format!("{}{}", &PHANTOM_STYLE[..43], bad);
            assert!(WalletAddress::parse(&candidate).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_public_key_bytes_requires_32_bytes() {
        // Plausible by charset and length, but decodes to fewer than 32 bytes
        let wallet = WalletAddress::parse(&"2".repeat(32)).unwrap();
        assert!(wallet.public_key_bytes().is_none());
    }
}
