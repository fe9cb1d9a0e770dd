//! Wire protocol for Nookline.
//!
//! This crate defines the "language" spoken over the game socket:
//!
//! - **Types** ([`ClientFrame`], [`ServerFrame`], [`Inbound`], the fighter
//!   stats payload) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing that.
//!
//! The protocol layer sits between the transport (raw frames) and the
//! session layer (auth, queueing). It knows nothing about connections,
//! challenges, or battles — only about shapes and bytes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AUTH_FAILED_ERROR, Animation, AuthFrame, ClientFrame, Fighter, FighterMeta,
    FighterPayload, Inbound, PlayerState, ServerFrame, Stats,
};
