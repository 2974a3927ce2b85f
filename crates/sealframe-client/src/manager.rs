//! Session manager: the async driver around the session state machine.
//!
//! Owns one [`Session`] and executes the MLS work it queues: joins on
//! start, resyncs on sustained `WrongKey` streams, and rejoin after a
//! missed rekey deadline. Bridge calls are bounded by the configured MLS
//! timeout and are the only awaited operations; the session lock is
//! never held across them.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use sealframe_core::{MediaKind, Session, SessionAction, SessionConfig, SessionState};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::bridge::{JoinInfo, MlsBridge};
use crate::error::ClientError;
use crate::participant::DisplayName;

/// Drives one conference participant's session against an MLS bridge.
///
/// Frame operations (`seal_frame`, `open_frame`) are synchronous and
/// non-blocking. Lifecycle operations (`start`, `resync`, `maintain`)
/// await the bridge and carry its timeout. Callers should invoke
/// [`maintain`](Self::maintain) periodically (once a second is plenty) so
/// deadlines fire and queued MLS work runs.
pub struct SessionManager<B> {
    bridge: B,
    identity: String,
    room_id: u64,
    mls_timeout: std::time::Duration,
    session: Mutex<Session>,
}

impl<B: MlsBridge> SessionManager<B> {
    /// Create a manager for one (identity, room) pair.
    pub fn new(
        bridge: B,
        identity: impl Into<String>,
        room_id: u64,
        config: SessionConfig,
    ) -> Self {
        Self {
            bridge,
            identity: identity.into(),
            room_id,
            mls_timeout: config.mls_timeout,
            session: Mutex::new(Session::new(config)),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    /// Installed epoch, when active.
    pub fn epoch(&self) -> Option<u64> {
        self.lock().epoch()
    }

    /// Join the room and install the first epoch.
    ///
    /// # Errors
    ///
    /// - `MlsFailure` / `Timeout` if the bridge fails (retry later)
    /// - `Cancelled` if the session was stopped meanwhile
    pub async fn start(&self) -> Result<(), ClientError> {
        self.lock().start()?;
        self.run_pending().await
    }

    /// Re-run the join; install and rekey if the epoch moved.
    ///
    /// Returns whether a new epoch was installed.
    pub async fn resync(&self) -> Result<bool, ClientError> {
        let changed = self.join_and_install().await?;
        if changed {
            debug!("resync installed a new epoch");
        }
        Ok(changed)
    }

    /// Drive time-based transitions and run any queued MLS work.
    pub async fn maintain(&self) -> Result<(), ClientError> {
        self.lock().tick(Instant::now());
        self.run_pending().await
    }

    /// Check the roster endpoint for an epoch advance.
    ///
    /// A changed epoch triggers the full rekey path; a roster-only change
    /// at the same epoch does not rekey (receiver contexts churn
    /// individually via [`on_participant_seen`](Self::on_participant_seen)
    /// and [`on_participant_gone`](Self::on_participant_gone)).
    ///
    /// Returns whether a new epoch was installed.
    pub async fn poll_roster(&self) -> Result<bool, ClientError> {
        let roster = timeout(self.mls_timeout, self.bridge.fetch_roster(self.room_id))
            .await
            .map_err(|_| ClientError::Timeout { elapsed: self.mls_timeout })??;

        match self.epoch() {
            Some(epoch) if epoch != roster.epoch => {
                debug!(from = epoch, to = roster.epoch, "roster reports a new epoch");
                self.resync().await
            },
            _ => Ok(false),
        }
    }

    /// Seal an outbound media frame. Non-blocking.
    ///
    /// While joining or rekeying this fails with `NoContext`; the caller
    /// may hold the frame briefly and retry, but never longer than one
    /// frame interval.
    ///
    /// # Errors
    ///
    /// Frame-level errors per [`Session::seal_frame`]. After
    /// `CounterExhausted`, run [`maintain`](Self::maintain) to execute
    /// the queued epoch rotation.
    pub fn seal_frame(&self, kind: MediaKind, plaintext: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(self.lock().seal_frame(kind, plaintext)?)
    }

    /// Open an inbound record. Non-blocking.
    ///
    /// # Errors
    ///
    /// Frame-level errors per [`Session::open_frame`]; callers convert
    /// them to drops. `NoContext` during startup is expected and silent.
    pub fn open_frame(&self, record: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(self.lock().open_frame(record, Instant::now())?)
    }

    /// A participant appeared on the SFU under `identity#leaf`.
    ///
    /// Installs a receiver context for the leaf under the current epoch.
    /// Returns whether a context was installed; a display name without a
    /// parseable leaf suffix installs nothing (and never triggers a
    /// subscription rekey).
    ///
    /// # Errors
    ///
    /// - `Frame(NoContext)` if no epoch is installed yet
    /// - `Cancelled` if the session is closed
    pub fn on_participant_seen(&self, display_name: &str) -> Result<bool, ClientError> {
        let name = DisplayName::parse(display_name);
        let Some(leaf) = name.leaf else {
            warn!(name = display_name, "participant without leaf suffix, not subscribing");
            return Ok(false);
        };

        let mut session = self.lock();
        if session.has_receiver(leaf) {
            return Ok(false);
        }
        session.on_remote_join(leaf, name.identity)?;
        Ok(true)
    }

    /// A participant disappeared from the SFU; drop its receiver context.
    pub fn on_participant_gone(&self, display_name: &str) {
        if let Some(leaf) = DisplayName::parse(display_name).leaf {
            self.lock().on_remote_leave(leaf);
        }
    }

    /// Tear the session down; all key material is zeroised.
    pub fn stop(&self) {
        self.lock().stop();
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().expect("session lock poisoned")
    }

    /// Execute queued session actions until none remain. Join, resync,
    /// and epoch rotation all reduce to a fresh join against the bridge:
    /// the group answers with whatever epoch is now current.
    async fn run_pending(&self) -> Result<(), ClientError> {
        loop {
            let actions = self.lock().take_actions();
            if actions.is_empty() {
                return Ok(());
            }
            for action in actions {
                match action {
                    SessionAction::Join => {
                        self.join_and_install().await?;
                    },
                    SessionAction::Resync | SessionAction::RotateEpoch => {
                        if self.join_and_install().await? {
                            debug!(?action, "epoch replaced");
                        } else {
                            warn!(?action, "group has not advanced yet");
                        }
                    },
                }
            }
        }
    }

    async fn join_and_install(&self) -> Result<bool, ClientError> {
        let joined = timeout(self.mls_timeout, self.bridge.join(&self.identity, self.room_id))
            .await
            .map_err(|_| ClientError::Timeout { elapsed: self.mls_timeout })??;

        self.install(joined)
    }

    fn install(&self, joined: JoinInfo) -> Result<bool, ClientError> {
        let mut session = self.lock();
        match session.state() {
            SessionState::Closed => Err(ClientError::Cancelled),
            SessionState::Active { epoch } if epoch == joined.info.epoch => Ok(false),
            SessionState::Active { .. } => {
                session.begin_rekey(joined.info.epoch, Instant::now())?;
                session.install_epoch(joined.info, joined.secret)?;
                Ok(true)
            },
            _ => {
                session.install_epoch(joined.info, joined.secret)?;
                Ok(true)
            },
        }
    }
}

impl<B: std::fmt::Debug> std::fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("bridge", &self.bridge)
            .field("identity", &self.identity)
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}
