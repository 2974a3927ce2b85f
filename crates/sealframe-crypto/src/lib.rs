//! Sealframe Cryptographic Primitives
//!
//! Cryptographic building blocks for Sealframe. Pure functions with
//! deterministic outputs; no I/O and no global state.
//!
//! # Key Lifecycle
//!
//! For each MLS epoch, a deterministic per-sender key and salt are derived
//! from the 32-byte epoch secret. The salt and the per-frame counter
//! produce the AEAD nonce, so every frame sealed under a key uses a
//! distinct nonce without any randomness.
//!
//! ```text
//! MLS Epoch Secret (32 bytes)
//!        │
//!        ▼
//! HKDF-SHA-256 → Sender Key + Salt (per epoch, per leaf)
//!        │
//!        ▼
//! Salt XOR Counter → Nonce (per frame)
//!        │
//!        ▼
//! AEAD seal → SFrame ciphertext + tag
//! ```
//!
//! # Security
//!
//! Forward secrecy at the epoch boundary:
//! - MLS epoch rotation replaces the epoch secret, invalidating every
//!   per-sender key derived from it
//! - Retired secrets and keys are zeroized on drop
//!
//! Sender isolation:
//! - Each sender's key is bound to its leaf index through the HKDF label
//! - Compromising one sender's key does not expose other senders' frames
//!
//! Authenticity:
//! - AES-GCM AEAD with the full SFrame header as associated data
//! - Failed authentication tag -> frame rejected, no state mutated

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod key_schedule;
mod nonce;
mod suite;

pub use error::CryptoError;
pub use key_schedule::{
    EPOCH_SECRET_SIZE, EpochSecret, SALT_SIZE, SenderMaterial, derive_sender_material,
};
pub use nonce::build_nonce;
pub use suite::{CipherSuite, NONCE_SIZE, TAG_SIZE, open, seal};
