//! Client transport: the dial/connection seam.
//!
//! [`Dialer`] produces fresh connections — once per reconnect attempt —
//! and [`Connection`] moves raw frames. The connection manager is generic
//! over both, so tests drive it with scripted in-memory connections and
//! production uses the `tokio-tungstenite` implementation behind the
//! `websocket` feature.

use std::future::Future;

use crate::TransportError;

/// A single open connection that can send and receive frames.
///
/// Owned exclusively by the connection actor, hence `&mut self` — there is
/// no sharing to synchronize. The methods return explicit `Send` futures
/// (rather than plain `async fn`) because the actor generic over this
/// trait runs inside `tokio::spawn`, which needs that bound; implementors
/// still just write `async fn`.
pub trait Connection: Send + 'static {
    /// Sends one frame to the server.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection. Best-effort; errors are irrelevant by then.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Dials the game server. The client mirror of a server transport's
/// `accept`.
pub trait Dialer: Send + 'static {
    /// The connection type produced by this dialer.
    type Conn: Connection;

    /// Opens a new connection to `endpoint`.
    fn dial(
        &mut self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Self::Conn, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// WebSocket implementation
// ---------------------------------------------------------------------------

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketDialer};

#[cfg(feature = "websocket")]
mod websocket {
    use tokio_tungstenite::tungstenite::Message;
    use tracing::debug;

    use super::{Connection, Dialer};
    use crate::TransportError;

    type WsStream = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Dials `ws://` / `wss://` endpoints via `tokio-tungstenite`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WebSocketDialer;

    impl Dialer for WebSocketDialer {
        type Conn = WebSocketConnection;

        async fn dial(&mut self, endpoint: &str) -> Result<Self::Conn, TransportError> {
            let (ws, _response) = tokio_tungstenite::connect_async(endpoint)
                .await
                .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
            debug!(endpoint, "WebSocket connection established");
            Ok(WebSocketConnection { ws })
        }
    }

    /// A single client WebSocket connection.
    pub struct WebSocketConnection {
        ws: WsStream,
    }

    impl Connection for WebSocketConnection {
        async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
            use futures_util::SinkExt;
            let msg = Message::Binary(data.to_vec().into());
            self.ws.send(msg).await.map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
        }

        async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            use futures_util::StreamExt;
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Some(text.as_bytes().to_vec()));
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(None),
                    Some(Ok(_)) => continue, // skip ping/pong/frame
                    Some(Err(e)) => {
                        return Err(TransportError::ReceiveFailed(std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        )));
                    }
                }
            }
        }

        async fn close(&mut self) {
            use futures_util::SinkExt;
            let _ = self.ws.close(None).await;
        }
    }
}
