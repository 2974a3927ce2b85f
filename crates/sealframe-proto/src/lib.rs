//! Sealframe Wire Format
//!
//! Encoding and decoding of SFrame records. A record on the wire is:
//!
//! ```text
//! [header: 1..17 bytes] ‖ [ciphertext: variable] ‖ [tag: 16 bytes]
//! ```
//!
//! The header carries the key identifier (KID) and frame counter (CTR) in
//! variable-length big-endian form; the full header byte string doubles as
//! the AEAD associated data. This crate is pure framing: it never touches
//! key material and performs no cryptography.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod header;
mod record;

pub use errors::ProtocolError;
pub use header::{MAX_HEADER_LEN, SframeHeader};
pub use record::{RecordInfo, RecordView, TAG_LEN};

/// Result type for wire-format operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
