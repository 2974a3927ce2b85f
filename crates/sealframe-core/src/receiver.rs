//! Receiver context: authenticates and decrypts inbound records.

use sealframe_crypto::{CipherSuite, SenderMaterial, build_nonce, open};
use sealframe_proto::RecordView;

use crate::error::FrameError;
use crate::replay::ReplayWindow;

/// Receive state for one remote sender in one epoch.
///
/// Holds the sender's derived key and salt, its audio and video key
/// identifiers, and a replay window spanning both media kinds (the remote
/// sender runs one counter across audio and video, so one window covers
/// both).
pub struct ReceiverContext {
    suite: CipherSuite,
    material: SenderMaterial,
    kid_audio: u64,
    kid_video: u64,
    window: ReplayWindow,
}

impl ReceiverContext {
    /// Create a context with a replay window of `window_width` counters.
    pub fn new(
        suite: CipherSuite,
        material: SenderMaterial,
        kid_audio: u64,
        kid_video: u64,
        window_width: usize,
    ) -> Self {
        Self { suite, material, kid_audio, kid_video, window: ReplayWindow::new(window_width) }
    }

    /// Whether a key identifier belongs to this context.
    pub fn owns_kid(&self, kid: u64) -> bool {
        kid == self.kid_audio || kid == self.kid_video
    }

    /// Largest counter opened so far. `None` before the first record.
    pub fn largest_seen(&self) -> Option<u64> {
        self.window.highest()
    }

    /// Authenticate and decrypt one record.
    ///
    /// The replay window is consulted before and updated only after a
    /// successful AEAD open, so records that fail authentication leave the
    /// window untouched.
    ///
    /// # Errors
    ///
    /// - `HeaderMalformed` if the record does not parse
    /// - `WrongKey` if the key identifier is not this context's
    /// - `Replay` if the counter was already seen or fell out of the window
    /// - `AuthFailed` if the tag does not verify
    pub fn open(&mut self, record: &[u8]) -> Result<Vec<u8>, FrameError> {
        let view = RecordView::parse(record)?;
        let header = view.header();

        if !self.owns_kid(header.kid()) {
            return Err(FrameError::WrongKey { kid: header.kid() });
        }

        self.window.check(header.ctr())?;

        let nonce = build_nonce(self.material.salt(), header.ctr());
        let plaintext = open(
            self.suite,
            self.material.key(),
            &nonce,
            view.header_bytes(),
            view.ciphertext_and_tag(),
        )
        .map_err(|_| FrameError::AuthFailed)?;

        self.window.commit(header.ctr());
        Ok(plaintext)
    }
}

impl std::fmt::Debug for ReceiverContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverContext")
            .field("suite", &self.suite)
            .field("kid_audio", &self.kid_audio)
            .field("kid_video", &self.kid_video)
            .field("largest_seen", &self.largest_seen())
            .finish_non_exhaustive()
    }
}
