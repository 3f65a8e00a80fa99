//! Pure, order-preserving queries over a sequence of events.
//!
//! Each selector accepts any iterator of borrowed events, typically
//! [`BufferState::events`](super::BufferState::events), and returns the
//! matching events in their original order.

use compact_str::CompactString;
use donafeed_sdk::objects::WebhookEvent;

/// Events whose `event_type` equals `event_type`.
pub fn select_by_type<'a>(
    events: impl IntoIterator<Item = &'a WebhookEvent>,
    event_type: &str,
) -> Vec<&'a WebhookEvent> {
    events
        .into_iter()
        .filter(|e| e.event_type == event_type)
        .collect()
}

/// Events related to `campaign_id`. Events without a campaign never match.
pub fn select_by_campaign<'a>(
    events: impl IntoIterator<Item = &'a WebhookEvent>,
    campaign_id: &str,
) -> Vec<&'a WebhookEvent> {
    events
        .into_iter()
        .filter(|e| e.campaign() == Some(campaign_id))
        .collect()
}

/// Events related to `user_id`. Events without a user never match.
pub fn select_by_user<'a>(
    events: impl IntoIterator<Item = &'a WebhookEvent>,
    user_id: &str,
) -> Vec<&'a WebhookEvent> {
    events
        .into_iter()
        .filter(|e| e.user() == Some(user_id))
        .collect()
}

/// A combination of the selectors above plus a result limit.
///
/// An empty `event_types` list matches every type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_types: Vec<CompactString>,
    pub campaign: Option<CompactString>,
    pub user: Option<CompactString>,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&event.event_type) {
            return false;
        }
        let campaign_ok = match &self.campaign {
            Some(campaign) => event.campaign() == Some(campaign.as_str()),
            None => true,
        };
        let user_ok = match &self.user {
            Some(user) => event.user() == Some(user.as_str()),
            None => true,
        };
        campaign_ok && user_ok
    }

    pub fn apply<'a>(
        &self,
        events: impl IntoIterator<Item = &'a WebhookEvent>,
    ) -> Vec<&'a WebhookEvent> {
        events
            .into_iter()
            .filter(|e| self.matches(e))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donafeed_sdk::objects::EventPayload;

    fn event(ts: &str, kind: &str, campaign: Option<&str>, user: Option<&str>) -> WebhookEvent {
        WebhookEvent::new(
            kind,
            ts,
            EventPayload {
                campaign: campaign.map(Into::into),
                user: user.map(Into::into),
                ..Default::default()
            },
        )
    }

    fn sample() -> Vec<WebhookEvent> {
        vec![
            event("t5", "X", Some("c1"), Some("u1")),
            event("t4", "donation_received", Some("c2"), None),
            event("t3", "X", None, Some("u2")),
            event("t2", "donation_received", Some("c1"), Some("u1")),
            event("t1", "X", Some("c1"), None),
        ]
    }

    fn ts<'a>(events: &[&'a WebhookEvent]) -> Vec<&'a str> {
        events.iter().map(|e| e.timestamp.as_str()).collect()
    }

    #[test]
    fn test_select_by_type_preserves_order() {
        let events = sample();
        assert_eq!(ts(&select_by_type(&events, "X")), vec!["t5", "t3", "t1"]);
        assert_eq!(
            ts(&select_by_type(&events, "donation_received")),
            vec!["t4", "t2"]
        );
        assert!(select_by_type(&events, "funds_withdrawn").is_empty());
    }

    #[test]
    fn test_select_by_campaign_excludes_missing_field() {
        let events = sample();
        assert_eq!(
            ts(&select_by_campaign(&events, "c1")),
            vec!["t5", "t2", "t1"]
        );
        assert_eq!(ts(&select_by_campaign(&events, "c2")), vec!["t4"]);
    }

    #[test]
    fn test_select_by_user_excludes_missing_field() {
        let events = sample();
        assert_eq!(ts(&select_by_user(&events, "u1")), vec!["t5", "t2"]);
        assert_eq!(ts(&select_by_user(&events, "u2")), vec!["t3"]);
        assert!(select_by_user(&events, "").is_empty());
    }

    #[test]
    fn test_filter_combines_and_limits() {
        let events = sample();
        let filter = EventFilter {
            event_types: vec!["X".into(), "donation_received".into()],
            campaign: Some("c1".into()),
            user: None,
            limit: Some(2),
        };
        assert_eq!(ts(&filter.apply(&events)), vec!["t5", "t2"]);

        let everything = EventFilter::default();
        assert_eq!(everything.apply(&events).len(), 5);
    }
}
