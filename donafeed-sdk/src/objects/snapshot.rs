//! Response body of `GET /events`.

use serde::{Deserialize, Serialize};

use super::events::WebhookEvent;

/// A consistent view of the server-side event buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    /// Newest first.
    pub events: Vec<WebhookEvent>,
    pub connected: bool,
    pub last_processed_timestamp: Option<String>,
    pub error: Option<String>,
}
