//! WebhookIngestor processor.
//!
//! The WebhookIngestor is responsible for:
//! - Validating a webhook batch (shape and size)
//! - Turning each `RawEvent` into a `WebhookEvent`
//! - Admitting accepted events into the `EventBuffer`
//! - Publishing them on the live broadcast
//! - Queueing donations and campaign creations for analytics
//!
//! Invalid elements do not fail the batch; they are reported per index in
//! the returned `WebhookResponse`.

use crate::buffer::{DeliveryError, EventBuffer};
use crate::config::{ConfigStore, IngestConfig};
use crate::events::{AnalyticsSender, LiveEventSender};
use crate::processors::metadata::{account, build_metadata, parse_amount};
use crate::utils::lamports::{lamports_to_sol, shorten_address};
use compact_str::CompactString;
use donafeed_sdk::objects::{
    BatchItemError, EventData, EventPayload, ParsedData, RawEvent, RawEventType, ServerEvent,
    WebhookEvent, WebhookResponse, iso_timestamp,
};
use kanau::processor::Processor;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Account keys that identify the acting user, most specific first.
const USER_ACCOUNT_KEYS: &[&str] = &["donor", "user", "authority"];

/// A webhook request body as received.
#[derive(Debug, Clone)]
pub struct WebhookBatch(pub Value);

/// Reasons a whole batch is rejected.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid data format")]
    InvalidFormat,

    #[error("Maximum batch size is {max} events")]
    BatchTooLarge { max: usize, received: usize },
}

/// Converts webhook batches into feed events.
pub struct WebhookIngestor {
    buffer: EventBuffer,
    live_tx: LiveEventSender,
    analytics_tx: Option<AnalyticsSender>,
    config: ConfigStore<IngestConfig>,
}

/// An element of a batch that passed validation.
struct Accepted {
    raw: RawEvent,
    kind: RawEventType,
    event: WebhookEvent,
}

impl WebhookIngestor {
    pub fn new(
        buffer: EventBuffer,
        live_tx: LiveEventSender,
        config: ConfigStore<IngestConfig>,
    ) -> Self {
        Self {
            buffer,
            live_tx,
            analytics_tx: None,
            config,
        }
    }

    /// Queue donations and campaign creations on `analytics_tx`.
    pub fn with_analytics(mut self, analytics_tx: AnalyticsSender) -> Self {
        self.analytics_tx = Some(analytics_tx);
        self
    }

    fn reject(&self, error: IngestError) -> IngestError {
        warn!(error = %error, "Rejected webhook batch");
        self.buffer
            .set_error(Some(DeliveryError::new(error.to_string())));
        error
    }

    /// Validate one batch element and build its feed event.
    fn accept(index: usize, item: Value) -> Result<Accepted, String> {
        let invalid_type = || format!("Invalid event type at index {index}");

        let (kind, raw) = parse_raw(item).ok_or_else(invalid_type)?;
        let metadata = build_metadata(kind, &raw.parsed_data.data)
            .ok_or_else(|| format!("Could not create metadata for event at index {index}"))?;

        let accounts = raw.accounts.clone().unwrap_or_default();
        let payload = EventPayload {
            data: EventData {
                amount: parse_amount(&raw.parsed_data.data),
            },
            campaign: account(&accounts, &["campaign"]),
            user: account(&accounts, USER_ACCOUNT_KEYS),
            metadata,
            block_time: raw.block_time.unwrap_or_else(now_millis),
            accounts,
            parsed_data: Some(raw.parsed_data.clone()),
        };

        let event = WebhookEvent::new(kind.event_type(), iso_timestamp(), payload);
        Ok(Accepted { raw, kind, event })
    }

    fn queue_for_analytics(&self, raw: RawEvent) {
        let Some(tx) = &self.analytics_tx else {
            return;
        };
        match tx.try_send(raw) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Analytics queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Analytics forwarder stopped, dropping event");
            }
        }
    }
}

impl Processor<WebhookBatch> for WebhookIngestor {
    type Output = WebhookResponse;
    type Error = IngestError;

    #[tracing::instrument(skip_all, err, name = "WebhookIngestor")]
    async fn process(&self, batch: WebhookBatch) -> Result<WebhookResponse, IngestError> {
        let Value::Array(items) = batch.0 else {
            return Err(self.reject(IngestError::InvalidFormat));
        };

        let max = self.config.snapshot().max_batch_size;
        if items.len() > max {
            return Err(self.reject(IngestError::BatchTooLarge {
                max,
                received: items.len(),
            }));
        }

        let total_events = items.len();
        let mut events_processed = 0;
        let mut errors = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            match Self::accept(index, item) {
                Ok(Accepted { raw, kind, event }) => {
                    let campaign = event
                        .campaign()
                        .map(|c| shorten_address(c, 4))
                        .unwrap_or_else(|| "-".to_owned());
                    debug!(
                        %kind,
                        %campaign,
                        amount_sol = lamports_to_sol(event.amount()),
                        "Accepted webhook event"
                    );
                    self.buffer.admit(event.clone());
                    // No live subscribers is not an error.
                    let _ = self.live_tx.send(ServerEvent::Webhook(event));
                    if kind.is_forwarded_to_analytics() {
                        self.queue_for_analytics(raw);
                    }
                    events_processed += 1;
                }
                Err(error) => {
                    debug!(index, error = %error, "Skipped webhook event");
                    errors.push(BatchItemError { index, error });
                }
            }
        }

        self.buffer.set_connected(true);

        info!(
            events_processed,
            total_events,
            skipped = total_events - events_processed,
            "Webhook batch ingested"
        );

        Ok(WebhookResponse {
            received: true,
            events_processed,
            total_events,
            skipped_events: total_events - events_processed,
            timestamp: iso_timestamp(),
            errors,
        })
    }
}

/// Read one batch element. Only `parsedData.type` is required to be
/// well formed; an unusable `blockTime` counts as absent and a non-object
/// `accounts` as empty.
fn parse_raw(item: Value) -> Option<(RawEventType, RawEvent)> {
    let Value::Object(mut fields) = item else {
        return None;
    };
    let Some(Value::Object(mut parsed)) = fields.remove("parsedData") else {
        return None;
    };
    let kind_name = match parsed.get("type") {
        Some(Value::String(name)) => CompactString::from(name.as_str()),
        _ => return None,
    };
    let kind = RawEventType::parse(&kind_name)?;

    let raw = RawEvent {
        parsed_data: ParsedData {
            kind: kind_name,
            data: parsed.remove("data").unwrap_or(Value::Null),
        },
        block_time: fields.get("blockTime").and_then(Value::as_i64),
        accounts: match fields.remove("accounts") {
            Some(Value::Object(accounts)) => Some(accounts),
            _ => None,
        },
    };
    Some((kind, raw))
}

fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
