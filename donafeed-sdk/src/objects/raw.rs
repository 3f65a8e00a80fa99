//! Inbound on-chain notifications as delivered by the webhook provider.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::events::event_types;

/// A decoded program instruction, one element of a webhook batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub parsed_data: ParsedData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Map<String, Value>>,
}

impl RawEvent {
    /// The instruction type, if it is one the feed understands.
    pub fn raw_type(&self) -> Option<RawEventType> {
        RawEventType::parse(&self.parsed_data.kind)
    }
}

/// Instruction name plus its decoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedData {
    #[serde(rename = "type")]
    pub kind: CompactString,
    #[serde(default)]
    pub data: Value,
}

/// Program instructions that produce feed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawEventType {
    CreateCampaign,
    Donate,
    Initialize,
    UpdateCampaign,
    WithdrawFunds,
}

impl RawEventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE_CAMPAIGN" => Some(Self::CreateCampaign),
            "DONATE" => Some(Self::Donate),
            "INITIALIZE" => Some(Self::Initialize),
            "UPDATE_CAMPAIGN" => Some(Self::UpdateCampaign),
            "WITHDRAW_FUNDS" => Some(Self::WithdrawFunds),
            _ => None,
        }
    }

    /// The feed event tag this instruction maps to.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::CreateCampaign => event_types::CAMPAIGN_CREATED,
            Self::Donate => event_types::DONATION_RECEIVED,
            Self::Initialize => event_types::USER_INITIALIZED,
            Self::UpdateCampaign => event_types::CAMPAIGN_UPDATED,
            Self::WithdrawFunds => event_types::FUNDS_WITHDRAWN,
        }
    }

    /// Only donations and campaign creations are forwarded to analytics.
    pub fn is_forwarded_to_analytics(self) -> bool {
        matches!(self, Self::Donate | Self::CreateCampaign)
    }
}

impl std::fmt::Display for RawEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateCampaign => write!(f, "CREATE_CAMPAIGN"),
            Self::Donate => write!(f, "DONATE"),
            Self::Initialize => write!(f, "INITIALIZE"),
            Self::UpdateCampaign => write!(f, "UPDATE_CAMPAIGN"),
            Self::WithdrawFunds => write!(f, "WITHDRAW_FUNDS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_parsing() {
        let json = r#"{
            "parsedData": {"type": "DONATE", "data": {"amount": "250000000"}},
            "blockTime": 1700000000,
            "accounts": {"campaign": "Camp1", "donor": "Donor1"}
        }"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.raw_type(), Some(RawEventType::Donate));
        assert_eq!(event.block_time, Some(1_700_000_000));
        assert_eq!(event.accounts.unwrap()["donor"], "Donor1");
    }

    #[test]
    fn test_unknown_instruction_type() {
        let json = r#"{"parsedData": {"type": "CLOSE_ACCOUNT"}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.raw_type(), None);
        assert!(event.parsed_data.data.is_null());
    }

    #[test]
    fn test_event_type_mapping() {
        assert_eq!(RawEventType::Donate.event_type(), "donation_received");
        assert_eq!(RawEventType::WithdrawFunds.event_type(), "funds_withdrawn");
        assert!(RawEventType::CreateCampaign.is_forwarded_to_analytics());
        assert!(!RawEventType::Initialize.is_forwarded_to_analytics());
    }
}
