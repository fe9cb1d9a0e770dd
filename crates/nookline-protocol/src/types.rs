//! Core protocol types for Nookline's wire format.
//!
//! Every structure here travels on the WebSocket as JSON. The game server
//! predates this client, so field names and `type` tags are not ours to
//! choose — the mixed casing (`playerUpdate` vs `challenge_request`) and the
//! `"Critical Chance"` stat key are the wire's, preserved with explicit
//! serde renames.
//!
//! Frames split by direction: [`ClientFrame`] is what we send,
//! [`ServerFrame`] is what we receive. The handful of untyped control frames
//! (auth handshake, server errors) never reach game code — they are decoded
//! through [`Inbound`] and consumed by the session layer.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The server's fatal authentication error, verbatim.
///
/// Receiving this exact string in an error frame permanently ends the
/// session; any other error text is non-fatal.
pub const AUTH_FAILED_ERROR: &str = "Authentication failed";

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Avatar animation keys shared with the sprite sheet.
///
/// Deserialization is tolerant: an unrecognized key falls back to
/// [`Animation::Stand`], the same fallback the renderer applies when asked
/// to play an animation it doesn't know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Animation {
    #[default]
    #[serde(rename = "stand")]
    Stand,
    #[serde(rename = "walk")]
    Walk,
    #[serde(rename = "runUp")]
    RunUp,
    #[serde(rename = "runDown")]
    RunDown,
}

impl Animation {
    /// Parses a wire animation key, falling back to `Stand` for unknowns.
    pub fn from_key(key: &str) -> Self {
        match key {
            "walk" => Self::Walk,
            "runUp" => Self::RunUp,
            "runDown" => Self::RunDown,
            _ => Self::Stand,
        }
    }

    /// The wire key for this animation.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Stand => "stand",
            Self::Walk => "walk",
            Self::RunUp => "runUp",
            Self::RunDown => "runDown",
        }
    }
}

impl<'de> Deserialize<'de> for Animation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let key = String::deserialize(deserializer)?;
        Ok(Animation::from_key(&key))
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Fighter stats payload
// ---------------------------------------------------------------------------

/// Combat stats as stored in the fighter metadata.
///
/// `critical_chance` is a probability in `[0, 1]`. It defaults to 0 when the
/// key is absent, matching the server's lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "HP")]
    pub hp: i32,
    #[serde(rename = "Attack")]
    pub attack: i32,
    #[serde(rename = "Defense")]
    pub defense: i32,
    #[serde(rename = "Speed")]
    pub speed: i32,
    #[serde(rename = "Critical Chance", default)]
    pub critical_chance: f64,
}

/// Fighter metadata envelope. The inscription JSON nests stats one level
/// down; other metadata keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterMeta {
    pub stats: Stats,
}

/// A fighter as it appears on the wire: inscription id plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: String,
    pub meta: FighterMeta,
}

/// One side of a `fight_start` payload: who is fighting, and with what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterPayload {
    pub username: String,
    #[serde(rename = "ordinooki")]
    pub fighter: Fighter,
}

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

fn default_scale() -> f32 {
    1.0
}

/// A peer's position and pose, as carried by `playerUpdate` broadcasts and
/// the initial `gameState` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub animation: Animation,
    #[serde(rename = "flipX", default)]
    pub flip_x: bool,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

// ---------------------------------------------------------------------------
// ClientFrame — messages we send
// ---------------------------------------------------------------------------

/// Outbound game messages.
///
/// `#[serde(tag = "type")]` produces the server's internally tagged format:
/// `{ "type": "challenge_request", "from": ..., "to": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Our avatar moved or changed pose. Identity is inferred server-side
    /// from the authenticated connection, so no username travels here.
    #[serde(rename = "playerUpdate")]
    PlayerUpdate {
        x: f32,
        y: f32,
        animation: Animation,
        #[serde(rename = "flipX")]
        flip_x: bool,
        scale: f32,
    },

    /// Ask `to` for a fight.
    #[serde(rename = "challenge_request")]
    ChallengeRequest { from: String, to: String },

    /// Accept a pending challenge from `to`.
    #[serde(rename = "challenge_accept")]
    ChallengeAccept { from: String, to: String },

    /// Decline a pending challenge from `to`.
    #[serde(rename = "challenge_decline")]
    ChallengeDecline { from: String, to: String },

    /// Withdraw a challenge we sent earlier.
    #[serde(rename = "challenge_cancel")]
    ChallengeCancel { from: String, to: String },

    /// Request kickoff of an agreed fight.
    #[serde(rename = "fight_start")]
    FightStart { from: String, to: String },

    /// Abort an agreed fight before or during kickoff.
    #[serde(rename = "fight_cancel")]
    FightCancel { from: String, to: String },
}

// ---------------------------------------------------------------------------
// ServerFrame — messages we receive
// ---------------------------------------------------------------------------

/// Inbound game messages. Unknown extra fields are ignored throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// A peer moved; rebroadcast by the server with the sender's identity.
    #[serde(rename = "playerUpdate")]
    PlayerUpdate {
        username: String,
        x: f32,
        y: f32,
        #[serde(default)]
        animation: Animation,
        #[serde(rename = "flipX", default)]
        flip_x: bool,
        #[serde(default = "default_scale")]
        scale: f32,
    },

    /// Initial world snapshot, sent once right after authentication.
    /// `players` excludes ourselves.
    #[serde(rename = "gameState")]
    GameState {
        map: String,
        players: HashMap<String, PlayerState>,
    },

    /// A peer's connection went away.
    #[serde(rename = "playerDisconnect")]
    PlayerDisconnect { username: String },

    /// Someone challenged `to` (us, when addressed to our name).
    #[serde(rename = "challenge_request")]
    ChallengeRequest { from: String, to: String },

    /// Our challenge was accepted. Kickoff still waits for `fight_start`.
    #[serde(rename = "challenge_accept")]
    ChallengeAccept { from: String, to: String },

    /// A pending challenge was declined.
    #[serde(rename = "challenge_decline")]
    ChallengeDecline { from: String, to: String },

    /// A pending challenge was withdrawn by its sender.
    #[serde(rename = "challenge_cancel")]
    ChallengeCancel { from: String, to: String },

    /// Server verdict on a challenge operation that could not be forwarded
    /// (e.g. the target is not connected). Domain notice, not an error.
    #[serde(rename = "challenge_response")]
    ChallengeResponse { success: bool, message: String },

    /// Authoritative battle kickoff with both full stat payloads.
    #[serde(rename = "fight_start")]
    FightStart {
        player1: FighterPayload,
        player2: FighterPayload,
    },

    /// Kickoff failed server-side (missing fighter selection or data).
    #[serde(rename = "fight_start_error")]
    FightStartError { message: String },

    /// The other side aborted an agreed fight.
    #[serde(rename = "fight_cancel")]
    FightCancel { from: String, to: String },
}

// ---------------------------------------------------------------------------
// Control frames
// ---------------------------------------------------------------------------

/// The first frame on every connection: the raw auth token, no `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthFrame {
    pub token: String,
}

/// Everything the socket can deliver.
///
/// Control frames carry no `type` tag, so inbound decode goes through this
/// untagged wrapper: error and auth-ack shapes are tried first, everything
/// else must be a typed [`ServerFrame`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// `{ "error": "..." }` — fatal iff the text is [`AUTH_FAILED_ERROR`].
    Error { error: String },
    /// `{ "authenticated": true }` — the auth handshake succeeded.
    AuthAck { authenticated: bool },
    /// A typed game message for subscribers.
    Frame(ServerFrame),
}

// =========================================================================
// Tests
// =========================================================================
