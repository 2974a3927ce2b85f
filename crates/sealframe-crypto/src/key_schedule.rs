//! Key derivation from the MLS epoch secret using HKDF
//!
//! Any participant deriving material for leaf `i` obtains the same key and
//! salt, so the sender's transmit material and every receiver's copy agree
//! without further coordination.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::suite::CipherSuite;

/// Size of the MLS epoch secret in bytes
pub const EPOCH_SECRET_SIZE: usize = 32;

/// Size of the per-sender nonce salt in bytes
pub const SALT_SIZE: usize = 12;

/// HKDF expand label prefix; the sender's leaf index is appended in decimal
const SENDER_LABEL_PREFIX: &str = "sframe/sender/";

/// The raw 32-byte MLS epoch secret.
///
/// Held only as long as new senders may still appear in the epoch;
/// zeroized on drop and never exposed through `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EpochSecret([u8; EPOCH_SECRET_SIZE]);

impl EpochSecret {
    /// Wrap a 32-byte secret.
    pub fn new(bytes: [u8; EPOCH_SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw secret bytes, for derivation only.
    pub(crate) fn as_bytes(&self) -> &[u8; EPOCH_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for EpochSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EpochSecret(..)")
    }
}

/// Per-sender traffic material: AEAD key plus nonce salt.
///
/// Bound to one (epoch, leaf index) pair; never reused across epochs.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SenderMaterial {
    key: Vec<u8>,
    salt: [u8; SALT_SIZE],
}

impl SenderMaterial {
    /// AEAD key for the context's cipher suite.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Salt XORed with the frame counter to build each nonce.
    pub fn salt(&self) -> &[u8; SALT_SIZE] {
        &self.salt
    }
}

impl std::fmt::Debug for SenderMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SenderMaterial(..)")
    }
}

/// Derive the traffic key and salt for one sender in one epoch.
///
/// HKDF-SHA-256: Extract with the all-zero 32-byte salt (the HKDF default
/// for SHA-256) over the epoch secret, then Expand with the UTF-8 label
/// `sframe/sender/<leaf-index-decimal>`.
///
/// The expand output is `key_size + 16` bytes: the first `key_size` bytes
/// are the AEAD key, the LAST 12 bytes are the salt, and the 4 bytes
/// between are discarded. For the default AES-128 suite this is the
/// 32-byte output split 16/12 with 4 discarded; both ends must use the
/// same split.
pub fn derive_sender_material(
    secret: &EpochSecret,
    leaf_index: u32,
    suite: CipherSuite,
) -> SenderMaterial {
    let hkdf = Hkdf::<Sha256>::new(None, secret.as_bytes());

    let label = format!("{SENDER_LABEL_PREFIX}{leaf_index}");

    let key_size = suite.key_size();
    let mut okm = vec![0u8; key_size + 16];
    let Ok(()) = hkdf.expand(label.as_bytes(), &mut okm) else {
        unreachable!("requested length is far below the HKDF-SHA256 limit");
    };

    let key = okm[..key_size].to_vec();
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&okm[okm.len() - SALT_SIZE..]);
    okm.zeroize();

    SenderMaterial { key, salt }
}
