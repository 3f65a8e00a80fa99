pub mod events;
pub mod raw;
pub mod snapshot;
pub mod stream;
pub mod webhook;

pub use events::{EventData, EventMetadata, EventPayload, MetadataUpdates, WebhookEvent, event_types};
pub use raw::{ParsedData, RawEvent, RawEventType};
pub use snapshot::EventsResponse;
pub use stream::{ConnectionStatus, ServerEvent, StreamSignal};
pub use webhook::{BatchItemError, WebhookErrorBody, WebhookResponse};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Current UTC time as an RFC 3339 string.
///
/// This is the format used for every `timestamp` field on the wire.
pub fn iso_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp_is_rfc3339() {
        let ts = iso_timestamp();
        assert!(OffsetDateTime::parse(&ts, &Rfc3339).is_ok());
    }
}
