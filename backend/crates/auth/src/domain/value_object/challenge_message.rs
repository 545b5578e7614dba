//! Challenge message
//!
//! Human-readable text the wallet signs. The layout follows the
//! Sign-In-With-Solana convention so that wallets render it cleanly:
//!
//! ```text
//! example.com wants you to sign in with your Solana account:
//! 9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM
//!
//! Sign this message to prove you own this wallet. ...
//!
//! Nonce: 4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi
//! Issued At: 2026-03-14T12:00:00.000Z
//! Expiration Time: 2026-03-14T12:05:00.000Z
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

const HEADER_SUFFIX: &str = " wants you to sign in with your Solana account:";
const STATEMENT: &str = "Sign this message to prove you own this wallet. \
This request will not trigger a blockchain transaction or cost any fees.";
const NONCE_PREFIX: &str = "Nonce: ";
const ISSUED_AT_PREFIX: &str = "Issued At: ";
const EXPIRATION_PREFIX: &str = "Expiration Time: ";

/// Fields embedded in a challenge message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeMessage {
    pub domain: String,
    pub wallet_address: String,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ChallengeMessage {
    pub fn render(&self) -> String {
        format!(
            "{domain}{HEADER_SUFFIX}\n{wallet}\n\n{STATEMENT}\n\n\
             {NONCE_PREFIX}{nonce}\n{ISSUED_AT_PREFIX}{issued}\n{EXPIRATION_PREFIX}{expires}",
            domain = self.domain,
            wallet = self.wallet_address,
            nonce = self.nonce,
            issued = rfc3339(self.issued_at),
            expires = rfc3339(self.expires_at),
        )
    }

    /// Recover the embedded fields from a submitted message
    ///
    /// Returns `None` when the text does not have the expected layout. The
    /// caller still compares the full text with the stored challenge.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        let domain = lines.next()?.strip_suffix(HEADER_SUFFIX)?.to_string();
        let wallet_address = lines.next()?.trim().to_string();

        let mut nonce = None;
        let mut issued_at = None;
        let mut expires_at = None;
        for line in lines {
            if let Some(v) = line.strip_prefix(NONCE_PREFIX) {
                nonce = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix(ISSUED_AT_PREFIX) {
                issued_at = Some(parse_time(v)?);
            } else if let Some(v) = line.strip_prefix(EXPIRATION_PREFIX) {
                expires_at = Some(parse_time(v)?);
            }
        }

        let nonce = nonce.filter(|n| !n.is_empty())?;
        if domain.is_empty() || wallet_address.is_empty() {
            return None;
        }

        Some(Self {
            domain,
            wallet_address,
            nonce,
            issued_at: issued_at?,
            expires_at: expires_at?,
        })
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
