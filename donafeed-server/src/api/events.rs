use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use compact_str::CompactString;
use donafeed_core::buffer::EventFilter;
use donafeed_sdk::objects::EventsResponse;
use serde::Deserialize;

use crate::state::AppState;

/// Query string of `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct EventsQuery {
    /// One or more event types, comma separated.
    #[serde(rename = "type")]
    event_type: Option<String>,
    campaign: Option<String>,
    user: Option<String>,
    limit: Option<usize>,
}

impl From<EventsQuery> for EventFilter {
    fn from(query: EventsQuery) -> Self {
        let event_types = query
            .event_type
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(CompactString::from)
            .collect();

        EventFilter {
            event_types,
            campaign: query.campaign.map(Into::into),
            user: query.user.map(Into::into),
            limit: query.limit,
        }
    }
}

/// `GET /events`: one consistent snapshot of the buffer, filtered.
pub(super) async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    let filter = EventFilter::from(query);
    let snapshot = state.buffer.snapshot();

    Json(EventsResponse {
        events: filter
            .apply(snapshot.events())
            .into_iter()
            .cloned()
            .collect(),
        connected: snapshot.connected(),
        last_processed_timestamp: snapshot.last_processed_timestamp().map(str::to_owned),
        error: snapshot.error().map(|e| e.message().to_owned()),
    })
}

/// `DELETE /events`: drop every buffered event.
pub(super) async fn clear_events(State(state): State<AppState>) -> StatusCode {
    state.buffer.clear();
    tracing::info!("Event buffer cleared");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use crate::state::test_state;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use donafeed_core::buffer::DeliveryError;
    use donafeed_sdk::objects::{EventPayload, WebhookEvent};
    use tower::ServiceExt;

    fn event(ts: &str, kind: &str, campaign: &str, user: &str) -> WebhookEvent {
        WebhookEvent::new(
            kind,
            ts,
            EventPayload {
                campaign: Some(campaign.into()),
                user: Some(user.into()),
                ..Default::default()
            },
        )
    }

    async fn get(router: axum::Router, uri: &str) -> EventsResponse {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn timestamps(response: &EventsResponse) -> Vec<&str> {
        response.events.iter().map(|e| e.timestamp.as_str()).collect()
    }

    #[test]
    fn test_query_to_filter() {
        let filter = EventFilter::from(EventsQuery {
            event_type: Some("donation_received, campaign_created,,".into()),
            campaign: Some("C1".into()),
            user: None,
            limit: Some(5),
        });
        assert_eq!(
            filter.event_types,
            vec![
                CompactString::from("donation_received"),
                CompactString::from("campaign_created")
            ]
        );
        assert_eq!(filter.campaign.as_deref(), Some("C1"));
        assert_eq!(filter.limit, Some(5));

        assert_eq!(EventFilter::from(EventsQuery::default()), EventFilter::default());
    }

    #[tokio::test]
    async fn test_list_events_filters_snapshot() {
        let state = test_state();
        state.buffer.admit(event("t1", "donation_received", "C1", "U1"));
        state.buffer.admit(event("t2", "campaign_created", "C2", "U1"));
        state.buffer.admit(event("t3", "donation_received", "C2", "U2"));
        state.buffer.set_connected(true);

        let all = get(build_router(state.clone()), "/events").await;
        assert_eq!(timestamps(&all), vec!["t3", "t2", "t1"]);
        assert!(all.connected);
        assert_eq!(all.last_processed_timestamp.as_deref(), Some("t3"));
        assert!(all.error.is_none());

        let donations = get(build_router(state.clone()), "/events?type=donation_received").await;
        assert_eq!(timestamps(&donations), vec!["t3", "t1"]);

        let by_campaign = get(build_router(state.clone()), "/events?campaign=C2&limit=1").await;
        assert_eq!(timestamps(&by_campaign), vec!["t3"]);

        let by_user = get(build_router(state), "/events?user=U1").await;
        assert_eq!(timestamps(&by_user), vec!["t2", "t1"]);
    }

    #[tokio::test]
    async fn test_clear_events_keeps_status() {
        let state = test_state();
        state.buffer.admit(event("t1", "donation_received", "C1", "U1"));
        state.buffer.set_error(Some(DeliveryError::new("upstream gone")));

        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let after = get(build_router(state), "/events").await;
        assert!(after.events.is_empty());
        assert!(after.last_processed_timestamp.is_none());
        assert_eq!(after.error.as_deref(), Some("upstream gone"));
        assert!(!after.connected);
    }
}
