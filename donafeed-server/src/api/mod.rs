//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `POST   /webhook`   – ingest a batch of on-chain notifications
//! - `GET    /events`    – filtered snapshot of the event buffer
//! - `DELETE /events`    – clear the event buffer
//! - `GET    /events/ws` – WebSocket live event stream

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod events;
mod webhook;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::receive_webhook))
        .route(
            "/events",
            get(events::list_events).delete(events::clear_events),
        )
        .route("/events/ws", get(ws::events_ws))
}
