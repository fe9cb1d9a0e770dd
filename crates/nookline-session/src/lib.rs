//! Client session management for Nookline.
//!
//! This crate owns the persistent game socket:
//!
//! 1. **Connecting** — dialing the endpoint, presenting the auth token as
//!    the first frame, re-dialing on failure ([`ConnectionManager`])
//! 2. **Buffering** — a strict FIFO queue for frames sent before the
//!    handshake completes (or before any socket exists)
//! 3. **Dispatch** — decoded inbound frames fanned out to typed
//!    subscribers in arrival order ([`Subscription`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Game layer (above)   ← routes frames to world / duel / battle
//!     ↕
//! Session layer (this crate)   ← auth, queueing, reconnection
//!     ↕
//! Protocol layer (below)   ← frame shapes and the JSON codec
//! ```

mod error;
mod manager;
mod session;
mod transport;

pub use error::{SessionError, TransportError};
pub use manager::{ConnectionManager, SessionEvents, Subscription};
pub use session::{Session, SessionConfig, SessionEvent};
pub use transport::{Connection, Dialer};
#[cfg(feature = "websocket")]
pub use transport::{WebSocketConnection, WebSocketDialer};
