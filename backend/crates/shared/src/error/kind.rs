//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum. Every failure in the system carries one,
//! and it is the only input used to pick the HTTP status and the wire code.

/// Error classification shared by every crate.
///
/// Each variant maps to exactly one HTTP status code and one stable wire code
/// (the `error.code` field of the response envelope).
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::RateLimited;
/// assert_eq!(kind.status_code(), 429);
/// assert_eq!(kind.code(), "RATE_LIMITED");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - Caller-fixable input problem
    Validation,
    /// 401 - Signed challenge did not verify (bad signature, expired, replayed)
    SignatureInvalid,
    /// 401 - No bearer credential was presented
    AuthRequired,
    /// 401 - A bearer credential was presented but is malformed or expired
    AuthInvalid,
    /// 404 - Resource does not exist
    NotFound,
    /// 429 - A rate limit was exceeded; retry later
    RateLimited,
    /// 502 - An upstream dependency (chain RPC) failed
    Upstream,
    /// 500 - Unexpected failure; never exposes internals
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::Validation.status_code(), 400);
    /// assert_eq!(ErrorKind::NotFound.status_code(), 404);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::SignatureInvalid | ErrorKind::AuthRequired | ErrorKind::AuthInvalid => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::Internal => 500,
            ErrorKind::Upstream => 502,
        }
    }

    /// Stable machine-readable code used in the response envelope
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::SignatureInvalid => "SIGNATURE_INVALID",
            ErrorKind::AuthRequired => "AUTH_REQUIRED",
            ErrorKind::AuthInvalid => "AUTH_INVALID",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Human readable label
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation Error",
            ErrorKind::SignatureInvalid => "Signature Invalid",
            ErrorKind::AuthRequired => "Authentication Required",
            ErrorKind::AuthInvalid => "Authentication Invalid",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::RateLimited => "Rate Limited",
            ErrorKind::Upstream => "Upstream Error",
            ErrorKind::Internal => "Internal Error",
        }
    }

    /// Whether the failure is on our side (5xx).
    ///
    /// Server errors are logged with the request id and rendered with a
    /// generic message.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Whether the caller may retry the same request later
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::Upstream)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::SignatureInvalid.status_code(), 401);
        assert_eq!(ErrorKind::AuthRequired.status_code(), 401);
        assert_eq!(ErrorKind::AuthInvalid.status_code(), 401);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::RateLimited.status_code(), 429);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
        assert_eq!(ErrorKind::Upstream.status_code(), 502);
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorKind::Validation.code(), "VALIDATION_ERROR");
        assert_eq!(ErrorKind::SignatureInvalid.code(), "SIGNATURE_INVALID");
        assert_eq!(ErrorKind::AuthRequired.code(), "AUTH_REQUIRED");
        assert_eq!(ErrorKind::AuthInvalid.code(), "AUTH_INVALID");
        assert_eq!(ErrorKind::NotFound.code(), "NOT_FOUND");
        assert_eq!(ErrorKind::RateLimited.code(), "RATE_LIMITED");
        assert_eq!(ErrorKind::Upstream.code(), "UPSTREAM_ERROR");
        assert_eq!(ErrorKind::Internal.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_is_server_error() {
        assert!(!ErrorKind::Validation.is_server_error());
        assert!(!ErrorKind::NotFound.is_server_error());
        assert!(ErrorKind::Internal.is_server_error());
        assert!(ErrorKind::Upstream.is_server_error());
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Upstream.is_retryable());
        assert!(!ErrorKind::SignatureInvalid.is_retryable());
    }
}
