//! Domain Services
//!
//! Wallet signature verification.

use base64::Engine as _;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::domain::value_object::wallet_address::WalletAddress;
use crate::error::{AuthError, AuthResult};

pub const SIGNATURE_BYTES: usize = 64;

/// Decode a detached signature
///
/// Wallet adapters hand out base58; some clients send base64 instead, so that
/// is accepted as a fallback. Anything that is not exactly 64 bytes is
/// rejected.
pub fn decode_signature(encoded: &str) -> Option<[u8; SIGNATURE_BYTES]> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }

    let from_base58 = bs58::decode(encoded)
        .into_vec()
        .ok()
        .and_then(|bytes| <[u8; SIGNATURE_BYTES]>::try_from(bytes).ok());
    if from_base58.is_some() {
        return from_base58;
    }

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
}

/// Verify an Ed25519 signature of `message` by the wallet's key
pub fn verify_wallet_signature(
    wallet: &WalletAddress,
    message: &[u8],
    signature: &str,
) -> AuthResult<()> {
    let key_bytes = wallet
        .public_key_bytes()
        .ok_or(AuthError::SignatureInvalid)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| AuthError::SignatureInvalid)?;

    let signature = decode_signature(signature).ok_or(AuthError::SignatureInvalid)?;
    let signature = Signature::from_bytes(&signature);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| AuthError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signer() -> (SigningKey, WalletAddress) {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let wallet = WalletAddress::parse(&bs58::encode(key.verifying_key().to_bytes()).into_string())
            .unwrap();
        (key, wallet)
    }

    #[test]
    fn test_valid_base58_signature() {
        let (key, wallet) = signer();
        let sig = bs58::encode(key.sign(b"sign me").to_bytes()).into_string();
        assert!(verify_wallet_signature(&wallet, b"sign me", &sig).is_ok());
    }

    #[test]
    fn test_valid_base64_signature() {
        let (key, wallet) = signer();
        let sig = base64::engine::general_purpose::STANDARD.encode(key.sign(b"sign me").to_bytes());
        assert!(verify_wallet_signature(&wallet, b"sign me", &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_or_key() {
        let (key, wallet) = signer();
        let (_, other_wallet) = signer();
        let sig = bs58::encode(key.sign(b"sign me").to_bytes()).into_string();

        assert!(matches!(
            verify_wallet_signature(&wallet, b"sign you", &sig),
            Err(AuthError::SignatureInvalid)
        ));
        assert!(verify_wallet_signature(&other_wallet, b"sign me", &sig).is_err());
    }

    #[test]
    fn test_malformed_signatures() {
        let (_, wallet) = signer();
        assert!(decode_signature("").is_none());
        assert!(decode_signature("abc").is_none());
        assert!(decode_signature(&bs58::encode([1u8; 63]).into_string()).is_none());
        assert!(verify_wallet_signature(&wallet, b"m", "not-a-signature!").is_err());
    }
}
