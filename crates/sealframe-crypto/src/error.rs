//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from AEAD and key-schedule operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Authentication tag mismatch (tampered or wrong key)
    #[error("authentication failed")]
    AuthFailed,

    /// Key material has the wrong length for the cipher suite
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length for the suite
        expected: usize,
        /// Actual key length supplied
        actual: usize,
    },

    /// Unknown cipher suite identifier
    #[error("unknown cipher suite: {0:#06x}")]
    UnknownSuite(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CryptoError::InvalidKeyLength { expected: 16, actual: 32 };
        assert_eq!(err.to_string(), "invalid key length: expected 16, got 32");
        assert_eq!(CryptoError::AuthFailed.to_string(), "authentication failed");
    }
}
