//! Live stream message types.
//!
//! The `GET /events/ws` endpoint upgrades to a WebSocket connection and
//! pushes [`ServerEvent`] JSON frames.
//!
//! # Protocol
//!
//! 1. The server sends a [`ServerEvent::Connection`] frame immediately
//!    after the upgrade, carrying the number of connected clients.
//! 2. Every accepted webhook event is pushed as a [`ServerEvent::Webhook`].
//! 3. A [`ServerEvent::Ping`] is sent periodically so idle connections
//!    stay open; clients ignore it.

use serde::{Deserialize, Serialize};

use super::events::WebhookEvent;

/// Server-to-client stream message.
///
/// Internally tagged so the client can dispatch on the `"type"` field:
///
/// ```json
/// {"type":"webhook","eventType":"donation_received","timestamp":"...","payload":{...}}
/// {"type":"connection","status":"connected","timestamp":"...","clientCount":3}
/// {"type":"ping","timestamp":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Webhook(WebhookEvent),
    Connection {
        status: ConnectionStatus,
        timestamp: String,
        #[serde(rename = "clientCount")]
        client_count: usize,
    },
    Ping {
        timestamp: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
}

/// What a stream consumer learns about the upstream feed.
///
/// Produced by the stream client and applied to an event buffer by
/// whoever owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// The connection is open.
    Connected,
    /// A webhook event arrived.
    Event(WebhookEvent),
    /// The connection closed.
    Disconnected,
    /// The connection failed; carries a human-readable reason.
    Failed(String),
}
