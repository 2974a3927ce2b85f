//! Conference session state machine.
//!
//! Owns the sender context for the local participant and one receiver
//! context per remote sender, and drives their lifecycle as epochs change
//! and participants churn. Uses the action pattern: methods take time as
//! input and surface MLS work as [`SessionAction`]s for the driver to
//! execute, keeping the state machine pure (no I/O).
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start  ┌─────────┐ install_epoch ┌───────────┐
//! │ Idle │───────>│ Joining │──────────────>│ Active(E) │
//! └──────┘        └─────────┘               └───────────┘
//!                      ▲                          │ begin_rekey
//!                      │ deadline                 ▼
//!                      │ (via Closed)       ┌──────────────┐
//!                      └─────────────────── │ Rekeying E→E'│──install_epoch──> Active(E')
//!                                           └──────────────┘
//!
//!            any state ──stop()──> Closed (keys zeroised)
//! ```

use std::collections::HashMap;
use std::ops::Sub;
use std::time::{Duration, Instant};

use sealframe_crypto::{CipherSuite, EpochSecret, derive_sender_material};
use sealframe_proto::SframeHeader;
use tracing::{debug, warn};

use crate::error::FrameError;
use crate::kid::{KidParts, MediaKind, compute_kid};
use crate::receiver::ReceiverContext;
use crate::replay::DEFAULT_REPLAY_WINDOW;
use crate::roster::{EpochInfo, LeafIndex};
use crate::sender::SenderContext;

/// Hard bound on an epoch transition before the session gives up and
/// rejoins.
pub const DEFAULT_REKEY_DEADLINE: Duration = Duration::from_secs(2);

/// Timeout the driver applies to MLS bridge operations.
pub const DEFAULT_MLS_TIMEOUT: Duration = Duration::from_secs(10);

/// Consecutive `WrongKey` failures from one remote sender before a resync
/// is requested.
pub const DEFAULT_WRONG_KEY_RESYNC_THRESHOLD: u32 = 8;

/// Minimum spacing between logged frame drops of the same kind.
const DROP_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// AEAD suite for every context in this session.
    pub suite: CipherSuite,
    /// Replay window width per receiver context, in counters.
    pub replay_window: usize,
    /// Maximum outbound stall during an epoch transition.
    pub rekey_deadline: Duration,
    /// Timeout for MLS bridge operations (applied by the driver).
    pub mls_timeout: Duration,
    /// `WrongKey` streak length that triggers a resync.
    pub wrong_key_resync_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            suite: CipherSuite::default(),
            replay_window: DEFAULT_REPLAY_WINDOW,
            rekey_deadline: DEFAULT_REKEY_DEADLINE,
            mls_timeout: DEFAULT_MLS_TIMEOUT,
            wrong_key_resync_threshold: DEFAULT_WRONG_KEY_RESYNC_THRESHOLD,
        }
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No epoch installed.
    Idle,
    /// A join or resync is in flight.
    Joining,
    /// Contexts live for the given epoch.
    Active {
        /// The installed epoch.
        epoch: u64,
    },
    /// Epoch transition in progress; old contexts drained.
    Rekeying {
        /// Epoch being retired.
        from: u64,
        /// Epoch being installed.
        to: u64,
    },
    /// All key material zeroised.
    Closed,
}

/// MLS work the driver must execute on the session's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Run the bridge join and feed the result to `install_epoch`.
    Join,
    /// Re-run the bridge join; rekey if the epoch changed.
    Resync,
    /// Ask the MLS group for an epoch rotation (counter space spent).
    RotateEpoch,
}

/// Allows an event at most once per interval; used to rate-limit
/// per-frame drop logs.
#[derive(Debug, Clone)]
struct RateLimited<I> {
    interval: Duration,
    last: Option<I>,
}

impl<I> RateLimited<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    fn allow(&mut self, now: I) -> bool {
        match self.last {
            Some(last) if now - last < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            },
        }
    }
}

/// State for one conference participant: sender context, receiver
/// contexts, and the epoch secret while it may still be needed.
///
/// Generic over the instant type to support virtual time in tests;
/// production uses `std::time::Instant`.
///
/// # Invariants
///
/// - At most one epoch's key material is live at a time
/// - `install_epoch` replaces everything atomically: the new sender
///   context and the receiver contexts for the whole roster land together
/// - The epoch secret is retained only while new senders may still appear
///   in the epoch, and is zeroised on replacement, on rekey, and on stop
pub struct Session<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    config: SessionConfig,
    state: SessionState,
    info: Option<EpochInfo>,
    secret: Option<EpochSecret>,
    sender: Option<SenderContext>,
    receivers: HashMap<LeafIndex, ReceiverContext>,
    rekey_started: Option<I>,
    wrong_key_streaks: HashMap<LeafIndex, u32>,
    drop_log: RateLimited<I>,
    actions: Vec<SessionAction>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a session in [`SessionState::Idle`].
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            info: None,
            secret: None,
            sender: None,
            receivers: HashMap::new(),
            rekey_started: None,
            wrong_key_streaks: HashMap::new(),
            drop_log: RateLimited::new(DROP_LOG_INTERVAL),
            actions: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Installed epoch. `None` outside `Active`.
    pub fn epoch(&self) -> Option<u64> {
        match self.state {
            SessionState::Active { epoch } => Some(epoch),
            _ => None,
        }
    }

    /// The local participant's leaf index, once an epoch is installed.
    pub fn local_leaf(&self) -> Option<LeafIndex> {
        self.info.as_ref().map(|info| info.local_leaf)
    }

    /// Number of live receiver contexts.
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Whether a receiver context exists for a remote leaf.
    pub fn has_receiver(&self, leaf: LeafIndex) -> bool {
        self.receivers.contains_key(&leaf)
    }

    /// Drain the MLS work queued since the last call.
    pub fn take_actions(&mut self) -> Vec<SessionAction> {
        std::mem::take(&mut self.actions)
    }

    /// Begin a session: `Idle → Joining`, queuing a join for the driver.
    /// A closed session may also be restarted this way.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if called while `Joining`, `Active`, or `Rekeying`
    pub fn start(&mut self) -> Result<(), FrameError> {
        match self.state {
            SessionState::Idle | SessionState::Closed => {
                self.state = SessionState::Joining;
                self.actions.push(SessionAction::Join);
                Ok(())
            },
            _ => Err(FrameError::Cancelled),
        }
    }

    /// Install an epoch: derive the sender context for the local leaf and
    /// a receiver context for every roster member, replacing any previous
    /// epoch's material.
    ///
    /// Completes `Joining → Active(E)` and `Rekeying(E→E') → Active(E')`;
    /// the sender context and the receivers for all currently known
    /// remote senders land together.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the session is `Closed`
    pub fn install_epoch(
        &mut self,
        info: EpochInfo,
        secret: EpochSecret,
    ) -> Result<(), FrameError> {
        if self.state == SessionState::Closed {
            return Err(FrameError::Cancelled);
        }

        let suite = self.config.suite;
        let material = derive_sender_material(&secret, info.local_leaf, suite);
        let kid_audio = compute_kid(info.epoch, info.room_id, info.local_leaf, MediaKind::Audio);
        let kid_video = compute_kid(info.epoch, info.room_id, info.local_leaf, MediaKind::Video);
        let sender = SenderContext::new(suite, material, kid_audio, kid_video);

        let mut receivers = HashMap::with_capacity(info.roster.len());
        for (leaf, _) in info.roster.iter() {
            receivers.insert(leaf, self.derive_receiver(&secret, info.epoch, info.room_id, leaf));
        }

        debug!(
            epoch = info.epoch,
            room = info.room_id,
            leaf = info.local_leaf,
            receivers = receivers.len(),
            "epoch installed"
        );

        // Old material drops (and zeroises) here.
        self.sender = Some(sender);
        self.receivers = receivers;
        self.secret = Some(secret);
        self.state = SessionState::Active { epoch: info.epoch };
        self.info = Some(info);
        self.rekey_started = None;
        self.wrong_key_streaks.clear();

        Ok(())
    }

    /// Enter `Rekeying`: a new epoch has been announced. Old contexts and
    /// the retired epoch secret are dropped immediately; outbound frames
    /// fail with `NoContext` until the new epoch is installed or the
    /// deadline passes.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the session is `Closed`
    pub fn begin_rekey(&mut self, to_epoch: u64, now: I) -> Result<(), FrameError> {
        match self.state {
            SessionState::Closed => Err(FrameError::Cancelled),
            SessionState::Active { epoch } => {
                self.state = SessionState::Rekeying { from: epoch, to: to_epoch };
                self.rekey_started = Some(now);
                self.clear_contexts();
                debug!(from = epoch, to = to_epoch, "rekeying");
                Ok(())
            },
            // Already joining or rekeying: the in-flight transition will
            // pick up the latest epoch when it completes.
            _ => Ok(()),
        }
    }

    /// Drive time-based transitions. Call periodically; on a missed rekey
    /// deadline the session passes through `Closed` back to `Joining` and
    /// queues a fresh join.
    pub fn tick(&mut self, now: I) {
        if let SessionState::Rekeying { from, to } = self.state {
            let deadline_passed = self
                .rekey_started
                .is_some_and(|started| now - started >= self.config.rekey_deadline);

            if deadline_passed {
                warn!(from, to, "rekey deadline missed, rejoining");
                self.clear_all();
                self.state = SessionState::Joining;
                self.actions.push(SessionAction::Join);
            }
        }
    }

    /// Seal an outbound media frame under the current epoch.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the session is `Closed`
    /// - `NoContext` while joining or rekeying (the driver may hold the
    ///   frame for a bounded interval, then drop it)
    /// - `CounterExhausted` when the counter space is spent; an epoch
    ///   rotation is queued for the driver
    /// - `FrameOversized` for plaintexts beyond the pipeline bound
    pub fn seal_frame(&mut self, kind: MediaKind, plaintext: &[u8]) -> Result<Vec<u8>, FrameError> {
        if self.state == SessionState::Closed {
            return Err(FrameError::Cancelled);
        }
        let Some(sender) = self.sender.as_mut() else {
            return Err(FrameError::NoContext);
        };

        match sender.seal(kind, plaintext) {
            Err(FrameError::CounterExhausted) => {
                warn!("sender counter exhausted, requesting epoch rotation");
                self.actions.push(SessionAction::RotateEpoch);
                Err(FrameError::CounterExhausted)
            },
            other => other,
        }
    }

    /// Open an inbound record, routing it to the receiver context for the
    /// sender leaf encoded in its key identifier.
    ///
    /// Per-frame failures are rate-limit logged and returned for the
    /// caller to convert into a drop; a sustained `WrongKey` stream from
    /// one sender queues a resync.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the session is `Closed`
    /// - `NoContext` before any epoch is installed or for an unknown
    ///   sender leaf (expected during startup; dropped silently)
    /// - `HeaderMalformed`, `WrongKey`, `Replay`, `AuthFailed` as the
    ///   record is validated
    pub fn open_frame(&mut self, record: &[u8], now: I) -> Result<Vec<u8>, FrameError> {
        if self.state == SessionState::Closed {
            return Err(FrameError::Cancelled);
        }

        let (header, _) = SframeHeader::decode(record).map_err(|e| {
            if self.drop_log.allow(now) {
                warn!(error = %e, "dropping frame with malformed header");
            }
            FrameError::HeaderMalformed(e)
        })?;

        let parts = KidParts::decompose(header.kid());
        let Some(receiver) = self.receivers.get_mut(&parts.leaf) else {
            // Expected while joining and for not-yet-subscribed senders.
            return Err(FrameError::NoContext);
        };

        match receiver.open(record) {
            Ok(plaintext) => {
                self.wrong_key_streaks.remove(&parts.leaf);
                Ok(plaintext)
            },
            Err(err @ FrameError::WrongKey { kid }) => {
                self.note_wrong_key(parts.leaf, kid, now);
                Err(err)
            },
            Err(err) => {
                if self.drop_log.allow(now) {
                    warn!(leaf = parts.leaf, ctr = header.ctr(), error = %err, "dropping frame");
                }
                Err(err)
            },
        }
    }

    /// A remote participant joined within the current epoch: derive and
    /// install its receiver context.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if the session is `Closed`
    /// - `NoContext` if no epoch (and so no epoch secret) is installed
    pub fn on_remote_join(
        &mut self,
        leaf: LeafIndex,
        identity: impl Into<String>,
    ) -> Result<(), FrameError> {
        if self.state == SessionState::Closed {
            return Err(FrameError::Cancelled);
        }
        let Some(secret) = self.secret.clone() else {
            return Err(FrameError::NoContext);
        };
        let Some(info) = self.info.as_mut() else {
            return Err(FrameError::NoContext);
        };

        info.roster.insert(leaf, identity);
        let (epoch, room_id) = (info.epoch, info.room_id);
        let receiver = self.derive_receiver(&secret, epoch, room_id, leaf);
        self.receivers.insert(leaf, receiver);
        debug!(leaf, "receiver context installed");
        Ok(())
    }

    /// A remote participant left: drop its receiver context (key material
    /// zeroises on drop).
    pub fn on_remote_leave(&mut self, leaf: LeafIndex) {
        if let Some(info) = self.info.as_mut() {
            info.roster.remove(leaf);
        }
        self.receivers.remove(&leaf);
        self.wrong_key_streaks.remove(&leaf);
        debug!(leaf, "receiver context dropped");
    }

    /// Tear the session down: every key and salt is overwritten before
    /// release and no further operation succeeds.
    pub fn stop(&mut self) {
        self.clear_all();
        self.state = SessionState::Closed;
        debug!("session closed");
    }

    fn derive_receiver(
        &self,
        secret: &EpochSecret,
        epoch: u64,
        room_id: u64,
        leaf: LeafIndex,
    ) -> ReceiverContext {
        let suite = self.config.suite;
        let material = derive_sender_material(secret, leaf, suite);
        ReceiverContext::new(
            suite,
            material,
            compute_kid(epoch, room_id, leaf, MediaKind::Audio),
            compute_kid(epoch, room_id, leaf, MediaKind::Video),
            self.config.replay_window,
        )
    }

    fn note_wrong_key(&mut self, leaf: LeafIndex, kid: u64, now: I) {
        let streak = self.wrong_key_streaks.entry(leaf).or_insert(0);
        *streak += 1;

        if self.drop_log.allow(now) {
            warn!(leaf, kid, streak = *streak, "dropping frame for foreign key id");
        }

        if *streak >= self.config.wrong_key_resync_threshold {
            self.wrong_key_streaks.remove(&leaf);
            self.actions.push(SessionAction::Resync);
        }
    }

    fn clear_contexts(&mut self) {
        self.sender = None;
        self.receivers.clear();
        self.secret = None;
    }

    fn clear_all(&mut self) {
        self.clear_contexts();
        self.info = None;
        self.rekey_started = None;
        self.wrong_key_streaks.clear();
    }
}
