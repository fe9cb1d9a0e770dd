//! Error types for the session layer.

/// Errors that can occur in the client transport.
///
/// All of these are recoverable from the manager's point of view: they
/// feed the bounded reconnect path rather than surfacing to callers.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Dialing the endpoint failed.
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    /// Sending a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

/// Errors that can occur using a [`ConnectionManager`](crate::ConnectionManager) handle.
///
/// Deliberately small: transport trouble never reaches the caller (it is
/// retried or surfaced as a terminal [`SessionEvent`](crate::SessionEvent)),
/// so the only way a handle operation fails is using it after teardown.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection manager has been shut down.
    #[error("connection manager is shut down")]
    Closed,
}
