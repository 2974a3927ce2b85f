//! Sender context: seals outbound media frames.

use sealframe_crypto::{CipherSuite, SenderMaterial, build_nonce, seal};
use sealframe_proto::{SframeHeader, TAG_LEN};

use crate::error::FrameError;
use crate::kid::MediaKind;

/// Largest plaintext the media pipeline may offer (2^20 bytes).
pub const MAX_PLAINTEXT_LEN: usize = 1 << 20;

/// Transmit state for the local participant in one epoch.
///
/// Holds the derived key and salt, the audio and video key identifiers,
/// and the frame counter shared by both media kinds. Sealing requires
/// `&mut self`, which serialises seals on one context: no two seals can
/// observe the same counter.
///
/// # Invariants
///
/// - The counter strictly increases across successful seals
/// - The counter never wraps: once 2⁶⁴−1 has been consumed, every further
///   seal fails with [`FrameError::CounterExhausted`]
/// - Failed seals do not consume the counter
pub struct SenderContext {
    suite: CipherSuite,
    material: SenderMaterial,
    kid_audio: u64,
    kid_video: u64,
    ctr: u64,
    exhausted: bool,
}

impl SenderContext {
    /// Create a context starting at counter zero.
    pub fn new(
        suite: CipherSuite,
        material: SenderMaterial,
        kid_audio: u64,
        kid_video: u64,
    ) -> Self {
        Self { suite, material, kid_audio, kid_video, ctr: 0, exhausted: false }
    }

    /// Override the starting counter. Only meaningful when resuming a
    /// context whose prior counter position is known out of band.
    #[must_use]
    pub fn with_counter(mut self, ctr: u64) -> Self {
        self.ctr = ctr;
        self
    }

    /// Key identifier used for a media kind.
    pub fn kid(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Audio => self.kid_audio,
            MediaKind::Video => self.kid_video,
        }
    }

    /// Counter the next seal will use.
    pub fn counter(&self) -> u64 {
        self.ctr
    }

    /// Whether the counter space is spent and the context must be retired.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Seal a media frame into an SFrame record: `header ‖ ct ‖ tag`.
    ///
    /// # Errors
    ///
    /// - `CounterExhausted` once the counter space is spent; no record is
    ///   emitted and the caller must rotate the epoch
    /// - `FrameOversized` for plaintexts beyond [`MAX_PLAINTEXT_LEN`];
    ///   the counter is not consumed
    pub fn seal(&mut self, kind: MediaKind, plaintext: &[u8]) -> Result<Vec<u8>, FrameError> {
        if self.exhausted {
            return Err(FrameError::CounterExhausted);
        }
        if plaintext.len() > MAX_PLAINTEXT_LEN {
            return Err(FrameError::FrameOversized {
                len: plaintext.len(),
                max: MAX_PLAINTEXT_LEN,
            });
        }

        let header = SframeHeader::new(self.kid(kind), self.ctr);
        let mut record = Vec::with_capacity(header.len() + plaintext.len() + TAG_LEN);
        header.encode(&mut record);

        let nonce = build_nonce(self.material.salt(), self.ctr);
        let Ok(body) = seal(self.suite, self.material.key(), &nonce, &record, plaintext) else {
            unreachable!("sender material is derived for this context's suite");
        };
        record.extend_from_slice(&body);

        // The counter is consumed only after a successful seal.
        if self.ctr == u64::MAX {
            self.exhausted = true;
        } else {
            self.ctr += 1;
        }

        Ok(record)
    }
}

impl std::fmt::Debug for SenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderContext")
            .field("suite", &self.suite)
            .field("kid_audio", &self.kid_audio)
            .field("kid_video", &self.kid_video)
            .field("ctr", &self.ctr)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
