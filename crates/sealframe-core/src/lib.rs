//! Sealframe Protocol Core
//!
//! Per-participant SFrame state for one conference: a sender context that
//! seals outbound media frames, receiver contexts that authenticate and
//! decrypt inbound records, and the session state machine that creates,
//! rekeys, and disposes them as participants and epochs change.
//!
//! # Architecture
//!
//! Everything in this crate is a pure state machine: no I/O, no clocks, no
//! randomness. Time is passed into the methods that need it, and MLS
//! operations surface as [`SessionAction`]s for a driver to execute (the
//! async driver lives in `sealframe-client`). This keeps every transition
//! deterministic and directly testable.
//!
//! ```text
//!            outbound frame + media kind
//!                      │
//!                      ▼
//!               ┌─────────────┐     seal      ┌───────────────┐
//!               │   Session   │──────────────▶│ SenderContext │
//!               └─────────────┘               └───────────────┘
//!                      │ KID routes by leaf
//!                      ▼
//!               ┌───────────────────┐
//!               │ ReceiverContext(s)│  replay window + AEAD open
//!               └───────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod kid;
mod receiver;
mod replay;
mod roster;
mod sender;
mod session;

pub use error::FrameError;
pub use kid::{KidParts, MediaKind, compute_kid};
pub use receiver::ReceiverContext;
pub use replay::{DEFAULT_REPLAY_WINDOW, ReplayWindow};
pub use roster::{EpochInfo, LeafIndex, Roster};
pub use sender::{MAX_PLAINTEXT_LEN, SenderContext};
pub use session::{Session, SessionAction, SessionConfig, SessionState};

pub use sealframe_crypto::{CipherSuite, EpochSecret};
