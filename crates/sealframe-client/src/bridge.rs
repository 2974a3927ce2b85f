//! MLS bridge: the seam to the external MLS group.
//!
//! The bridge obtains the current epoch's group secret, the local
//! participant's leaf index, and the roster. It is the only component
//! that handles the raw epoch secret; once derived keys are installed,
//! the secret lives on only inside the session (for senders that may
//! still appear in the epoch).
//!
//! The wire protocol is the minimal JSON-over-HTTP surface the core
//! requires from an MLS server:
//!
//! - `POST /mls/join` `{identity, room_id}` →
//!   `{sender_index, epoch, group_id, room_id, roster, master_secret}`
//! - `GET /mls/roster?room_id=ID` → `{epoch, group_id, room_id, roster}`
//!
//! `master_secret` is the base64 of the 32-byte epoch secret. Joining
//! with an identity already in the roster reuses its leaf index; the
//! server guarantees this, the client merely relies on it.

use base64::Engine;
use sealframe_core::{EpochInfo, EpochSecret, LeafIndex, Roster};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Result of a successful join: everything needed to install the epoch.
#[derive(Debug)]
pub struct JoinInfo {
    /// Epoch metadata, roster, and the local leaf index.
    pub info: EpochInfo,
    /// The raw epoch secret; handed straight to the session.
    pub secret: EpochSecret,
}

/// A roster snapshot without key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterInfo {
    /// Epoch the snapshot belongs to.
    pub epoch: u64,
    /// MLS group identifier.
    pub group_id: String,
    /// Room the group serves.
    pub room_id: u64,
    /// Members at this epoch.
    pub roster: Roster,
}

/// Outcome of a resync: whether the epoch moved, plus the fresh join.
#[derive(Debug)]
pub struct Resync {
    /// True when the returned epoch differs from the cached one; the
    /// caller MUST rekey in that case.
    pub changed: bool,
    /// The fresh join result (valid either way).
    pub join: JoinInfo,
}

/// Access to the external MLS group.
///
/// Operations perform network I/O and are the only suspension points in
/// the system; the session manager bounds them with its configured
/// timeout.
pub trait MlsBridge: Send + Sync {
    /// Join (or re-join) the group for a room, returning the current
    /// epoch secret, the local leaf index, and the roster.
    fn join(
        &self,
        identity: &str,
        room_id: u64,
    ) -> impl std::future::Future<Output = Result<JoinInfo, ClientError>> + Send;

    /// Fetch the current roster without joining.
    fn fetch_roster(
        &self,
        room_id: u64,
    ) -> impl std::future::Future<Output = Result<RosterInfo, ClientError>> + Send;

    /// Re-run the join and report whether the epoch changed relative to
    /// `current_epoch`. A changed epoch obliges the caller to rekey.
    fn resync(
        &self,
        identity: &str,
        room_id: u64,
        current_epoch: u64,
    ) -> impl std::future::Future<Output = Result<Resync, ClientError>> + Send {
        async move {
            let join = self.join(identity, room_id).await?;
            Ok(Resync { changed: join.info.epoch != current_epoch, join })
        }
    }
}

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    identity: &'a str,
    room_id: u64,
}

#[derive(Debug, Deserialize)]
struct WireMember {
    index: LeafIndex,
    identity: String,
}

#[derive(Debug, Deserialize)]
struct JoinResponse {
    sender_index: LeafIndex,
    epoch: u64,
    group_id: String,
    room_id: u64,
    roster: Vec<WireMember>,
    master_secret: String,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    epoch: u64,
    group_id: String,
    room_id: u64,
    roster: Vec<WireMember>,
}

fn roster_from_wire(members: Vec<WireMember>) -> Roster {
    Roster::from_entries(members.into_iter().map(|m| (m.index, m.identity)))
}

fn decode_secret(master_secret: &str) -> Result<EpochSecret, ClientError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(master_secret)
        .map_err(|e| ClientError::MlsFailure { reason: format!("bad master_secret: {e}") })?;

    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| ClientError::MlsFailure {
        reason: format!("master_secret is {} bytes, expected 32", b.len()),
    })?;

    Ok(EpochSecret::new(bytes))
}

/// MLS bridge over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMlsBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMlsBridge {
    /// Create a bridge against a server base URL (e.g.
    /// `http://localhost:3030`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: trim_slash(base_url.into()) }
    }

    /// Create a bridge reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: trim_slash(base_url.into()) }
    }

    /// The configured server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

fn transport_failure(e: reqwest::Error) -> ClientError {
    ClientError::MlsFailure { reason: e.to_string() }
}

/// Surface any non-2xx status as a bridge failure.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::MlsFailure { reason: format!("server returned {status}") })
    }
}

impl MlsBridge for HttpMlsBridge {
    async fn join(&self, identity: &str, room_id: u64) -> Result<JoinInfo, ClientError> {
        let url = format!("{}/mls/join", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&JoinRequest { identity, room_id })
            .send()
            .await
            .map_err(transport_failure)?;

        let body: JoinResponse =
            check_status(response)?.json().await.map_err(transport_failure)?;

        let secret = decode_secret(&body.master_secret)?;
        Ok(JoinInfo {
            info: EpochInfo {
                epoch: body.epoch,
                room_id: body.room_id,
                group_id: body.group_id,
                local_leaf: body.sender_index,
                roster: roster_from_wire(body.roster),
            },
            secret,
        })
    }

    async fn fetch_roster(&self, room_id: u64) -> Result<RosterInfo, ClientError> {
        let url = format!("{}/mls/roster", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("room_id", room_id)])
            .send()
            .await
            .map_err(transport_failure)?;

        let body: RosterResponse =
            check_status(response)?.json().await.map_err(transport_failure)?;

        Ok(RosterInfo {
            epoch: body.epoch,
            group_id: body.group_id,
            room_id: body.room_id,
            roster: roster_from_wire(body.roster),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_response_parses() {
        let json = r#"{
            "sender_index": 2,
            "epoch": 7,
            "group_id": "0badcafe",
            "room_id": 1234,
            "roster": [
                {"index": 0, "identity": "server"},
                {"index": 2, "identity": "alice"}
            ],
            "master_secret": "ERERERERERERERERERERERERERERERERERERERERERE="
        }"#;

        let body: JoinResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.sender_index, 2);
        assert_eq!(body.epoch, 7);
        assert_eq!(body.roster.len(), 2);

        let roster = roster_from_wire(body.roster);
        assert_eq!(roster.identity(2), Some("alice"));
    }

    #[test]
    fn secret_decodes_to_32_bytes() {
        // base64 of 32 bytes of 0x11.
        let secret = decode_secret("ERERERERERERERERERERERERERERERERERERERERERE=");
        assert!(secret.is_ok());
    }

    #[test]
    fn short_secret_rejected() {
        let err = decode_secret("EQ==").unwrap_err();
        assert!(matches!(err, ClientError::MlsFailure { reason } if reason.contains("1 bytes")));
    }

    #[test]
    fn invalid_base64_rejected() {
        let err = decode_secret("!!not base64!!").unwrap_err();
        assert!(matches!(err, ClientError::MlsFailure { .. }));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let bridge = HttpMlsBridge::new("http://localhost:3030/");
        assert_eq!(bridge.base_url(), "http://localhost:3030");
    }
}
