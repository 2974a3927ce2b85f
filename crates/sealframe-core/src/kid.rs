//! Key identifier layout.
//!
//! Every SFrame record carries a 64-bit key identifier that locates the
//! epoch, room, sender leaf, and media kind that sealed it:
//!
//! ```text
//! KID = epoch·10⁹ + room·10⁴ + leaf·10 + media_bit
//! ```
//!
//! The decimal radices keep KIDs human-readable in logs and packet dumps.
//! The encoding is injective as long as `room < 100_000` and `leaf < 1000`,
//! comfortably above any realistic conference size. The audio and video
//! identifiers of one sender differ by exactly 1.

use crate::roster::LeafIndex;

/// Multiplier applied to the epoch number
pub const EPOCH_RADIX: u64 = 1_000_000_000;

/// Multiplier applied to the room id
pub const ROOM_RADIX: u64 = 10_000;

/// Multiplier applied to the leaf index
pub const LEAF_RADIX: u64 = 10;

/// Which media stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Audio frames (media bit 0)
    Audio,
    /// Video frames (media bit 1)
    Video,
}

impl MediaKind {
    /// The media bit in the key identifier.
    pub fn bit(self) -> u64 {
        match self {
            Self::Audio => 0,
            Self::Video => 1,
        }
    }

    fn from_bit(bit: u64) -> Self {
        if bit == 0 { Self::Audio } else { Self::Video }
    }
}

/// Compute the key identifier for one (epoch, room, leaf, media) tuple.
pub fn compute_kid(epoch: u64, room_id: u64, leaf: LeafIndex, media: MediaKind) -> u64 {
    epoch * EPOCH_RADIX + room_id * ROOM_RADIX + u64::from(leaf) * LEAF_RADIX + media.bit()
}

/// A key identifier decomposed back into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KidParts {
    /// MLS epoch encoded in the identifier
    pub epoch: u64,
    /// Room id encoded in the identifier
    pub room_id: u64,
    /// Sender leaf index encoded in the identifier
    pub leaf: LeafIndex,
    /// Media kind encoded in the identifier
    pub media: MediaKind,
}

impl KidParts {
    /// Decompose a key identifier.
    ///
    /// Inverse of [`compute_kid`] for identifiers built with the default
    /// radices; arbitrary values decompose without error but may not
    /// correspond to any live sender.
    pub fn decompose(kid: u64) -> Self {
        let epoch = kid / EPOCH_RADIX;
        let rest = kid % EPOCH_RADIX;
        let room_id = rest / ROOM_RADIX;
        let rest = rest % ROOM_RADIX;
        let leaf = (rest / LEAF_RADIX) as LeafIndex;
        let media = MediaKind::from_bit(rest % 2);

        Self { epoch, room_id, leaf, media }
    }
}
