//! Broker transport seam.
//!
//! [`Transport`] opens connections and [`Connection`] moves text frames.
//! The production implementation is [`WsTransport`] over
//! `tokio-tungstenite`; tests substitute an in-memory pair.

use std::fmt;
use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::ConsoleError;

/// Opens broker connections.
pub trait Transport: Send + Sync + 'static {
    /// Connection type produced by [`Transport::connect`].
    type Conn: Connection;

    /// Opens a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Transport`] if the broker is unreachable or
    /// rejects the handshake.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Conn, ConsoleError>> + Send;
}

/// One open, bidirectional broker connection carrying text frames.
pub trait Connection: Send + 'static {
    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Transport`] if the connection is broken.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), ConsoleError>> + Send;

    /// Receives the next text frame; `None` once the peer closed.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, ConsoleError>>> + Send;

    /// Closes the connection. Errors are logged, not returned.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// WebSocket transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, ConsoleError> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(transport_error)?;
        tracing::debug!(status = %response.status(), url, "websocket handshake complete");
        Ok(WsConnection { stream })
    }
}

/// WebSocket connection produced by [`WsTransport`].
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConnection").finish_non_exhaustive()
    }
}

impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), ConsoleError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(transport_error)
    }

    async fn recv(&mut self) -> Option<Result<String, ConsoleError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("ignoring non-utf8 binary frame"),
                },
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite itself
                Ok(_) => {}
                Err(e) => return Some(Err(transport_error(e))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "websocket close failed");
        }
    }
}

fn transport_error(e: tokio_tungstenite::tungstenite::Error) -> ConsoleError {
    ConsoleError::Transport(e.to_string())
}
