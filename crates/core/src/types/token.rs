//! Opaque session tokens.

use core::fmt;

use serde::Serialize;

/// Errors that can occur when reading a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No token was supplied.
    #[error("token is missing")]
    Missing,
    /// The supplied value cannot be a token this service issued.
    #[error("token is malformed")]
    Malformed,
}

/// A session token proving a prior successful login.
///
/// Tokens are [`SessionToken::BYTES`] random bytes rendered as lowercase hex.
/// The randomness is supplied by the caller so this crate stays free of I/O.
///
/// `Debug` never prints the token value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Number of random bytes in a token.
    pub const BYTES: usize = 32;

    /// Length of the hex-encoded token.
    pub const LENGTH: usize = Self::BYTES * 2;

    /// Authorization scheme accepted in front of the token.
    pub const BEARER_SCHEME: &'static str = "Bearer";

    /// Encode freshly generated random bytes as a token.
    #[must_use]
    pub fn from_random_bytes(bytes: &[u8; Self::BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a bare token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Missing` for an empty string and
    /// `TokenError::Malformed` for anything that is not 64 hex digits.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        if s.is_empty() {
            return Err(TokenError::Missing);
        }
        if s.len() != Self::LENGTH || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TokenError::Malformed);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Read a token from an `Authorization` header value.
    ///
    /// The `Bearer ` prefix is optional; a bare token is accepted too.
    ///
    /// ```
    /// use cartwheel_core::SessionToken;
    ///
    /// let raw = "ab".repeat(32);
    /// let bearer = SessionToken::from_authorization_header(&format!("Bearer {raw}")).unwrap();
    /// let bare = SessionToken::from_authorization_header(&raw).unwrap();
    /// assert_eq!(bearer, bare);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::parse`].
    pub fn from_authorization_header(value: &str) -> Result<Self, TokenError> {
        let value = value.trim();
        let raw = match value.strip_prefix(Self::BEARER_SCHEME) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                rest.trim_start()
            }
            _ => value,
        };
        Self::parse(raw)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw() -> String {
        "0f".repeat(SessionToken::BYTES)
    }

    #[test]
    fn test_from_random_bytes_is_fixed_length_hex() {
        let token = SessionToken::from_random_bytes(&[0xab; SessionToken::BYTES]);
        assert_eq!(token.as_str().len(), SessionToken::LENGTH);
        assert_eq!(token.as_str(), "ab".repeat(SessionToken::BYTES));
    }

    #[test]
    fn test_header_with_and_without_prefix() {
        let expected = SessionToken::parse(&raw()).unwrap();
        assert_eq!(
            SessionToken::from_authorization_header(&format!("Bearer {}", raw())).unwrap(),
            expected
        );
        assert_eq!(
            SessionToken::from_authorization_header(&raw()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_header_empty() {
        assert_eq!(
            SessionToken::from_authorization_header(""),
            Err(TokenError::Missing)
        );
        assert_eq!(
            SessionToken::from_authorization_header("Bearer "),
            Err(TokenError::Missing)
        );
    }

    #[test]
    fn test_header_malformed() {
        assert_eq!(
            SessionToken::from_authorization_header("Bearer not-a-token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            SessionToken::parse(&"zz".repeat(SessionToken::BYTES)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_uppercase_hex_is_normalized() {
        let upper = "AB".repeat(SessionToken::BYTES);
        assert_eq!(
            SessionToken::parse(&upper).unwrap().as_str(),
            "ab".repeat(SessionToken::BYTES)
        );
    }

    #[test]
    fn test_debug_redacts() {
        let token = SessionToken::parse(&raw()).unwrap();
        assert!(!format!("{token:?}").contains(&raw()));
    }
}
