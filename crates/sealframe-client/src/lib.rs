//! Sealframe Client
//!
//! The async driver around the pure session core: it talks to the
//! external MLS server over HTTP, installs epochs into the session,
//! executes the session's queued actions (join, resync, epoch rotation),
//! and parses the SFU-side participant naming convention.
//!
//! # Components
//!
//! - [`MlsBridge`]: the seam to the external MLS group (join, roster,
//!   resync); [`HttpMlsBridge`] is the production implementation
//! - [`SessionManager`]: owns one [`sealframe_core::Session`] and drives
//!   its lifecycle with timeouts and deadlines
//! - [`DisplayName`]: the `identity#leaf` convention carried through the
//!   SFU, parsed into a structured value at the boundary

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod error;
mod manager;
mod participant;

pub use bridge::{HttpMlsBridge, JoinInfo, MlsBridge, Resync, RosterInfo};
pub use error::ClientError;
pub use manager::SessionManager;
pub use participant::DisplayName;

pub use sealframe_core::{
    CipherSuite, FrameError, MediaKind, Session, SessionConfig, SessionState,
};
