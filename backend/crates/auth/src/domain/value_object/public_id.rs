//! PublicId Value Object
//!
//! Compact, URL-safe identifier shown to other users instead of the internal
//! UUID. Wraps a 21-character Nanoid.

use std::fmt;
use std::str::FromStr;

use nid::Nanoid;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(Nanoid);

impl PublicId {
    pub fn new() -> Self {
        Self(Nanoid::new())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for PublicId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PublicId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Nanoid::from_str(s)
            .map(PublicId)
            .map_err(|e| AuthError::Internal(format!("Invalid public_id: {e}")))
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_default_length() {
        assert_eq!(PublicId::new().as_str().len(), 21);
        assert_ne!(PublicId::new(), PublicId::new());
    }

    #[test]
    fn test_parse() {
        let id: PublicId = "0123456789abcdefghi01".parse().unwrap();
        assert_eq!(id.to_string(), "0123456789abcdefghi01");
        assert!("not a nanoid!".parse::<PublicId>().is_err());
    }
}
