//! Live stream client.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in a WebSocket stack.

mod stream;

pub use stream::{EventStreamClient, decode_frame, reconnect_delay};

/// Errors produced by the stream client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, handshake, connection reset, …).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Every reconnect attempt failed.
    #[error("gave up after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The receiving side of the signal channel is gone.
    #[error("signal channel closed")]
    ChannelClosed,
}
