//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The protocol layer doesn't care how frames are serialized — it needs
//! something that implements [`Codec`]. The game server speaks JSON, so
//! [`JsonCodec`] is the default (and currently only) implementation; a
//! binary codec could be added behind its own feature without touching any
//! other layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between frame types and raw bytes.
///
/// `Send + Sync + 'static` because codecs are held by long-lived connection
/// tasks that Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Matches the server's wire format and keeps frames readable in browser
/// DevTools and logs.
///
/// ## Example
///
/// ```rust
/// use nookline_protocol::{ClientFrame, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = ClientFrame::ChallengeRequest {
///     from: "alice".into(),
///     to: "bob".into(),
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: ClientFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
