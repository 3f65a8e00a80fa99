//! Donation feed event types.
//!
//! A [`WebhookEvent`] is one notification about an on-chain crowdfunding
//! occurrence (a donation, a new campaign, a withdrawal, ...). It is built
//! by the server from a [`RawEvent`](super::RawEvent) and fanned out to
//! every live stream subscriber.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::raw::ParsedData;

/// Well-known values of [`WebhookEvent::event_type`].
///
/// The tag is an open string on the wire, these are the ones the server
/// produces.
pub mod event_types {
    pub const CAMPAIGN_CREATED: &str = "campaign_created";
    pub const DONATION_RECEIVED: &str = "donation_received";
    pub const USER_INITIALIZED: &str = "user_initialized";
    pub const CAMPAIGN_UPDATED: &str = "campaign_updated";
    pub const FUNDS_WITHDRAWN: &str = "funds_withdrawn";
}

/// One received notification of a donation-related occurrence.
///
/// On the live stream this is wrapped in
/// [`ServerEvent::Webhook`](super::ServerEvent::Webhook), which adds the
/// `"type": "webhook"` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Kind of occurrence, e.g. `donation_received`.
    pub event_type: CompactString,
    /// RFC 3339 creation time. Doubles as the event identifier.
    pub timestamp: String,
    pub payload: EventPayload,
}

impl WebhookEvent {
    pub fn new(
        event_type: impl Into<CompactString>,
        timestamp: impl Into<String>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: timestamp.into(),
            payload,
        }
    }

    /// Transferred amount in lamports (0 when the event carries none).
    pub fn amount(&self) -> u64 {
        self.payload.data.amount
    }

    pub fn campaign(&self) -> Option<&str> {
        self.payload.campaign.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.payload.user.as_deref()
    }
}

/// Payload carried by a [`WebhookEvent`].
///
/// `campaign` and `user` are explicit optionals: events that do not relate
/// to a campaign (e.g. `user_initialized`) simply leave the field absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default)]
    pub data: EventData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<CompactString>,
    #[serde(default)]
    pub metadata: EventMetadata,
    /// Block time as delivered by the provider, or the receive time in
    /// milliseconds when the provider sent none.
    #[serde(default)]
    pub block_time: i64,
    #[serde(default)]
    pub accounts: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<ParsedData>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// Smallest currency unit (lamports).
    #[serde(default)]
    pub amount: u64,
}

/// Human-facing details extracted from the instruction data.
///
/// Which fields are set depends on the event type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<MetadataUpdates>,
}

/// Fields changed by a campaign update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_urgent: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names_are_camel_case() {
        let event = WebhookEvent::new(
            event_types::DONATION_RECEIVED,
            "2026-01-01T00:00:00Z",
            EventPayload {
                data: EventData { amount: 1_500_000_000 },
                campaign: Some("Camp1".into()),
                block_time: 42,
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "donation_received");
        assert_eq!(json["payload"]["data"]["amount"], 1_500_000_000u64);
        assert_eq!(json["payload"]["campaign"], "Camp1");
        assert_eq!(json["payload"]["blockTime"], 42);
        assert!(json["payload"].get("user").is_none());
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = r#"{"eventType":"user_initialized","timestamp":"t1","payload":{}}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.amount(), 0);
        assert_eq!(event.campaign(), None);
        assert_eq!(event.user(), None);
    }
}
