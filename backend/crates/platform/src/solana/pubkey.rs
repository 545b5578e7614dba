//! Public keys and program-derived addresses

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use thiserror::Error;

use crate::crypto::sha256;

pub const PUBKEY_BYTES: usize = 32;
pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PubkeyError {
    #[error("Invalid base58 public key")]
    InvalidBase58,

    #[error("Public key must be {PUBKEY_BYTES} bytes, got {0}")]
    WrongLength(usize),

    #[error("Seeds exceed limits")]
    MaxSeedLengthExceeded,

    #[error("No viable bump seed")]
    NoViableBump,
}

/// 32-byte account address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, PubkeyError> {
        let array: [u8; PUBKEY_BYTES] = bytes
            .try_into()
            .map_err(|_| PubkeyError::WrongLength(bytes.len()))?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    /// Whether the bytes decompress to a point on the ed25519 curve
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    /// Derive an address from seeds and a bump without searching
    ///
    /// Fails when the result lands on the curve, since such an address could
    /// have a private key.
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<Pubkey, PubkeyError> {
        if seeds.len() > MAX_SEEDS || seeds.iter().any(|s| s.len() > MAX_SEED_LEN) {
            return Err(PubkeyError::MaxSeedLengthExceeded);
        }

        let mut buf = Vec::with_capacity(seeds.iter().map(|s| s.len()).sum::<usize>() + 64);
        for seed in seeds {
            buf.extend_from_slice(seed);
        }
        buf.extend_from_slice(program_id.as_bytes());
        buf.extend_from_slice(PDA_MARKER);

        let candidate = Pubkey(sha256(&buf));
        if candidate.is_on_curve() {
            return Err(PubkeyError::NoViableBump);
        }
        Ok(candidate)
    }

    /// Find the canonical program-derived address (highest viable bump)
    pub fn find_program_address(
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<(Pubkey, u8), PubkeyError> {
        if seeds.len() >= MAX_SEEDS {
            return Err(PubkeyError::MaxSeedLengthExceeded);
        }

        for bump in (0..=u8::MAX).rev() {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = seeds.to_vec();
            with_bump.push(&bump_seed);

            match Self::create_program_address(&with_bump, program_id) {
                Ok(address) => return Ok((address, bump)),
                Err(PubkeyError::NoViableBump) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(PubkeyError::NoViableBump)
    }
}

impl FromStr for Pubkey {
    type Err = PubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 32 bytes never encode to more than 44 base58 characters
        if s.len() > 44 {
            return Err(PubkeyError::InvalidBase58);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| PubkeyError::InvalidBase58)?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::programs;

    #[test]
    fn test_parse_and_display() {
        let s = "BGUMAp9Gq7iTEuizy4pqaxsTyUCBK68MDfK752saRPUY";
        let key: Pubkey = s.parse().unwrap();
        assert_eq!(key, programs::BUBBLEGUM);
        assert_eq!(key.to_string(), s);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("0OIl".parse::<Pubkey>(), Err(PubkeyError::InvalidBase58));
        assert!(matches!(
            "abc".parse::<Pubkey>(),
            Err(PubkeyError::WrongLength(_))
        ));
    }

    #[test]
    fn test_find_program_address_is_off_curve_and_reproducible() {
        let tree: Pubkey = "noopb9bkMVfRPU8AsbpTUg8AQkHtKwMYZiFUjNRtMmV".parse().unwrap();
        let (pda, bump) =
            Pubkey::find_program_address(&[tree.as_ref()], &programs::BUBBLEGUM).unwrap();

        assert!(!pda.is_on_curve());
        let again =
            Pubkey::create_program_address(&[tree.as_ref(), &[bump]], &programs::BUBBLEGUM)
                .unwrap();
        assert_eq!(pda, again);
    }

    #[test]
    fn test_wallet_keys_are_on_curve() {
        let signing = ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]);
        let key = Pubkey::new_from_array(signing.verifying_key().to_bytes());
        assert!(key.is_on_curve());
    }

    #[test]
    fn test_seed_limits() {
        let long = [0u8; 33];
        assert_eq!(
            Pubkey::create_program_address(&[&long], &programs::BUBBLEGUM),
            Err(PubkeyError::MaxSeedLengthExceeded)
        );
    }
}
