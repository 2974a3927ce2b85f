//! SFrame header codec.
//!
//! The header encodes two unsigned integers, the key identifier (KID) and
//! the frame counter (CTR), both variable length, with the lengths packed
//! into a single configuration byte:
//!
//! ```text
//! byte 0:   1 X X X  K K C C
//!           │ │ │ │  └─┴──┴┴── KK = KID length - 1, CC = CTR length - 1
//!           │ │ │ └─────────── reserved, must be zero
//!           │ │ └───────────── CTR length extension: adds 4
//!           │ └─────────────── KID length extension: adds 4
//!           └───────────────── SFrame marker (always 1)
//! ```
//!
//! With the extension bits each field spans 1..8 bytes, covering the full
//! u64 range. Field bytes follow the configuration byte MSB-first: KID
//! first, then CTR. The whole header byte string is the AEAD associated
//! data for the record.

use bytes::BufMut;

use crate::errors::ProtocolError;

/// Marker bit distinguishing SFrame records from legacy cleartext
const MARKER: u8 = 0x80;

/// KID length extension flag (adds 4 bytes)
const KID_EXT: u8 = 0x40;

/// CTR length extension flag (adds 4 bytes)
const CTR_EXT: u8 = 0x20;

/// Reserved bit, must be zero
const RESERVED: u8 = 0x10;

/// Maximum encoded header length: config byte + 8-byte KID + 8-byte CTR
pub const MAX_HEADER_LEN: usize = 17;

/// Decoded SFrame header: key identifier and frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SframeHeader {
    kid: u64,
    ctr: u64,
}

/// Minimal big-endian byte length of a value (zero still takes one byte).
fn field_len(value: u64) -> usize {
    let bytes = (u64::BITS - value.leading_zeros()).div_ceil(8) as usize;
    bytes.max(1)
}

/// Write the low `len` bytes of `value`, most significant first.
fn put_be(dst: &mut impl BufMut, value: u64, len: usize) {
    dst.put_slice(&value.to_be_bytes()[8 - len..]);
}

/// Read `len` bytes as a big-endian unsigned integer.
fn get_be(src: &[u8]) -> u64 {
    src.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

impl SframeHeader {
    /// Create a header for the given key identifier and counter.
    #[must_use]
    pub fn new(kid: u64, ctr: u64) -> Self {
        Self { kid, ctr }
    }

    /// Key identifier.
    #[must_use]
    pub fn kid(&self) -> u64 {
        self.kid
    }

    /// Frame counter.
    #[must_use]
    pub fn ctr(&self) -> u64 {
        self.ctr
    }

    /// Encoded length in bytes (canonical minimal encoding).
    #[must_use]
    pub fn len(&self) -> usize {
        1 + field_len(self.kid) + field_len(self.ctr)
    }

    /// Whether the encoding is a lone configuration byte. Never true: KID
    /// and CTR each occupy at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Encode into a buffer, returning the number of bytes written.
    pub fn encode(&self, dst: &mut impl BufMut) -> usize {
        let kid_len = field_len(self.kid);
        let ctr_len = field_len(self.ctr);

        let mut config = MARKER;
        let k = (kid_len - 1) as u8;
        if k >= 4 {
            config |= KID_EXT;
        }
        config |= (k & 0b11) << 2;

        let c = (ctr_len - 1) as u8;
        if c >= 4 {
            config |= CTR_EXT;
        }
        config |= c & 0b11;

        dst.put_u8(config);
        put_be(dst, self.kid, kid_len);
        put_be(dst, self.ctr, ctr_len);

        1 + kid_len + ctr_len
    }

    /// Encode to an owned byte vector.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.encode(&mut buf);
        buf
    }

    /// Decode a header from the front of `bytes`.
    ///
    /// Returns the header and the number of bytes it occupied. Trailing
    /// bytes (ciphertext and tag) are ignored here.
    ///
    /// # Errors
    ///
    /// - `TruncatedHeader` if the buffer ends before the declared lengths
    /// - `MissingMarker` if the SFrame marker bit is absent
    /// - `ReservedBits` if the reserved configuration bit is set
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), ProtocolError> {
        let &[config, ref rest @ ..] = bytes else {
            return Err(ProtocolError::TruncatedHeader { expected: 1, actual: 0 });
        };

        if config & MARKER == 0 {
            return Err(ProtocolError::MissingMarker);
        }
        if config & RESERVED != 0 {
            return Err(ProtocolError::ReservedBits);
        }

        let mut kid_len = ((config >> 2) & 0b11) as usize + 1;
        if config & KID_EXT != 0 {
            kid_len += 4;
        }
        let mut ctr_len = (config & 0b11) as usize + 1;
        if config & CTR_EXT != 0 {
            ctr_len += 4;
        }

        let total = 1 + kid_len + ctr_len;
        if rest.len() < kid_len + ctr_len {
            return Err(ProtocolError::TruncatedHeader { expected: total, actual: bytes.len() });
        }

        let kid = get_be(&rest[..kid_len]);
        let ctr = get_be(&rest[kid_len..kid_len + ctr_len]);

        Ok((Self { kid, ctr }, total))
    }
}
