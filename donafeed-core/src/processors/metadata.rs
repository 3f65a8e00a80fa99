//! Extraction of feed payload fields from raw instruction data.
//!
//! Instruction data arrives as loosely typed JSON. Every field is checked
//! for the expected JSON type and replaced by a default when it does not
//! match, so a partially filled instruction still yields a usable event.

use compact_str::CompactString;
use donafeed_sdk::objects::{EventMetadata, MetadataUpdates, RawEventType};
use serde_json::{Map, Value};

/// Build the metadata for an instruction of type `kind`.
///
/// Returns `None` when `data` is neither a JSON object nor an array. An
/// array carries no named fields, so every field takes its default.
pub fn build_metadata(kind: RawEventType, data: &Value) -> Option<EventMetadata> {
    let empty = Map::new();
    let data = match data {
        Value::Object(fields) => fields,
        Value::Array(_) => &empty,
        _ => return None,
    };

    let metadata = match kind {
        RawEventType::CreateCampaign => EventMetadata {
            title: Some(string_or(data, "title", "Untitled")),
            category: Some(string_or(data, "category", "Unknown")),
            target_amount: Some(string_or(data, "targetAmount", "0")),
            organization: Some(string_or(data, "organizationName", "Unknown")),
            start_date: int_field(data, "startDate"),
            end_date: int_field(data, "endDate"),
            is_urgent: Some(bool_field(data, "isUrgent").unwrap_or(false)),
            ..Default::default()
        },
        RawEventType::Donate => EventMetadata {
            amount: Some(string_or(data, "amount", "0")),
            payment_method: Some(string_or(data, "paymentMethod", "Unknown")),
            ..Default::default()
        },
        RawEventType::Initialize => EventMetadata {
            name: Some(string_or(data, "name", "Unknown")),
            ..Default::default()
        },
        RawEventType::UpdateCampaign => EventMetadata {
            updates: Some(MetadataUpdates {
                description: string_field(data, "description"),
                image_url: string_field(data, "imageUrl"),
                end_date: int_field(data, "endDate"),
                status: string_field(data, "status"),
                is_urgent: bool_field(data, "isUrgent"),
            }),
            ..Default::default()
        },
        RawEventType::WithdrawFunds => EventMetadata {
            amount: Some(string_or(data, "amount", "0")),
            ..Default::default()
        },
    };
    Some(metadata)
}

/// Lamport amount from `data.amount`, accepting a decimal string or a
/// non-negative integer. Anything else counts as 0.
pub fn parse_amount(data: &Value) -> u64 {
    match data.get("amount") {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

/// First string-valued account among `keys`, in order.
pub fn account(accounts: &Map<String, Value>, keys: &[&str]) -> Option<CompactString> {
    keys.iter()
        .find_map(|key| accounts.get(*key).and_then(Value::as_str))
        .map(CompactString::from)
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn string_or(data: &Map<String, Value>, key: &str, default: &str) -> String {
    string_field(data, key).unwrap_or_else(|| default.to_owned())
}

fn int_field(data: &Map<String, Value>, key: &str) -> Option<i64> {
    data.get(key).and_then(Value::as_i64)
}

fn bool_field(data: &Map<String, Value>, key: &str) -> Option<bool> {
    data.get(key).and_then(Value::as_bool)
}
