//! AEAD cipher suites
//!
//! A single seal/open primitive, pluggable by suite identifier. The suite
//! is fixed for the lifetime of a sender or receiver context and is never
//! carried on the wire; both ends know it from the group configuration.

use aes_gcm::{
    Aes128Gcm, Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::error::CryptoError;

/// AEAD nonce size in bytes (both suites)
pub const NONCE_SIZE: usize = 12;

/// AEAD authentication tag size in bytes (both suites)
pub const TAG_SIZE: usize = 16;

/// Registered AEAD suites, identified by their RFC 9605 numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherSuite {
    /// AES-128-GCM with SHA-256 key schedule (default)
    #[default]
    AesGcm128Sha256,
    /// AES-256-GCM with SHA-512 suite identifier
    AesGcm256Sha512,
}

impl CipherSuite {
    /// Suite identifier as registered on both ends.
    pub fn id(self) -> u16 {
        match self {
            Self::AesGcm128Sha256 => 0x0004,
            Self::AesGcm256Sha512 => 0x0005,
        }
    }

    /// Look up a suite by identifier.
    ///
    /// # Errors
    ///
    /// - `UnknownSuite` if the identifier is not registered
    pub fn from_id(id: u16) -> Result<Self, CryptoError> {
        match id {
            0x0004 => Ok(Self::AesGcm128Sha256),
            0x0005 => Ok(Self::AesGcm256Sha512),
            other => Err(CryptoError::UnknownSuite(other)),
        }
    }

    /// AEAD key size in bytes.
    pub fn key_size(self) -> usize {
        match self {
            Self::AesGcm128Sha256 => 16,
            Self::AesGcm256Sha512 => 32,
        }
    }

    /// Parse a suite from a configuration string. `None` if unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aes-gcm128-sha256" | "aesgcm128" | "128" => Some(Self::AesGcm128Sha256),
            "aes-gcm256-sha512" | "aesgcm256" | "256" => Some(Self::AesGcm256Sha512),
            _ => None,
        }
    }
}

/// Seal a plaintext: `ciphertext ‖ tag`.
///
/// # Errors
///
/// - `InvalidKeyLength` if `key` does not match the suite's key size
pub fn seal(
    suite: CipherSuite,
    key: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload { msg: plaintext, aad };
    let nonce = Nonce::from_slice(nonce);

    let result = match suite {
        CipherSuite::AesGcm128Sha256 => {
            let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeyLength { expected: suite.key_size(), actual: key.len() }
            })?;
            cipher.encrypt(nonce, payload)
        },
        CipherSuite::AesGcm256Sha512 => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeyLength { expected: suite.key_size(), actual: key.len() }
            })?;
            cipher.encrypt(nonce, payload)
        },
    };

    let Ok(ciphertext) = result else {
        unreachable!("AES-GCM encryption cannot fail with a valid key and nonce");
    };
    Ok(ciphertext)
}

/// Open `ciphertext ‖ tag`, returning the plaintext.
///
/// # Errors
///
/// - `InvalidKeyLength` if `key` does not match the suite's key size
/// - `AuthFailed` if the tag does not verify (tampered or wrong key)
pub fn open(
    suite: CipherSuite,
    key: &[u8],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let payload = Payload { msg: ciphertext, aad };
    let nonce = Nonce::from_slice(nonce);

    let result = match suite {
        CipherSuite::AesGcm128Sha256 => {
            let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeyLength { expected: suite.key_size(), actual: key.len() }
            })?;
            cipher.decrypt(nonce, payload)
        },
        CipherSuite::AesGcm256Sha512 => {
            let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
                CryptoError::InvalidKeyLength { expected: suite.key_size(), actual: key.len() }
            })?;
            cipher.decrypt(nonce, payload)
        },
    };

    result.map_err(|_| CryptoError::AuthFailed)
}
