// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the composite query surface: filters, pagination, the user
//! sentinel, and team-key expansion.

use serde_json::json;

use super::{ingest_json, test_persistence};
use crate::error::ApiError;
use crate::query::{EventQuery, QueryService};
use crate::request_response::{EventsResponse, MappingDto, UpsertOrgRequest};
use crate::teams::TeamService;
use toolscope_domain::USER_FILTER_NONE;
use toolscope_persistence::Persistence;

fn seed_events(persistence: &Persistence, count: usize, kind: &str, user: &str) {
    for n in 0..count {
        ingest_json(
            persistence,
            &json!({
                "eventType": kind,
                "sessionId": format!("s-{n}"),
                "userId": format!("uid-{user}"),
                "userName": user
            }),
        );
    }
}

#[test]
fn test_events_default_page_is_newest_first() {
    let persistence = test_persistence();
    seed_events(&persistence, 3, "tool_call", "alice");

    let page: EventsResponse =
        QueryService::events(&persistence, &EventQuery::default()).unwrap();
    assert_eq!(page.events.len(), 3);
    assert!(!page.has_more);
    assert_eq!(page.total, Some(3));
    assert!(page.events[0].id > page.events[1].id);
    assert!(page.events[1].id > page.events[2].id);
}

#[test]
fn test_events_pagination_reports_has_more() {
    let persistence = test_persistence();
    seed_events(&persistence, 5, "tool_call", "alice");

    let query = EventQuery {
        limit: Some(2),
        ..EventQuery::default()
    };
    let first: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert_eq!(first.events.len(), 2);
    assert!(first.has_more);
    assert_eq!(first.total, Some(5));

    let last = EventQuery {
        limit: Some(2),
        offset: Some(4),
        ..EventQuery::default()
    };
    let last: EventsResponse = QueryService::events(&persistence, &last).unwrap();
    assert_eq!(last.events.len(), 1);
    assert!(!last.has_more);
}

#[test]
fn test_events_rejects_out_of_range_limits() {
    let persistence = test_persistence();
    for limit in [0, 501, -1] {
        let query = EventQuery {
            limit: Some(limit),
            ..EventQuery::default()
        };
        let err = QueryService::events(&persistence, &query).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput { .. }), "limit {limit}");
    }

    let negative_offset = EventQuery {
        offset: Some(-1),
        ..EventQuery::default()
    };
    assert!(QueryService::events(&persistence, &negative_offset).is_err());
}

#[test]
fn test_user_sentinel_short_circuits_to_empty() {
    let persistence = test_persistence();
    seed_events(&persistence, 3, "tool_call", "alice");

    let query = EventQuery {
        user_ids: vec![String::from("alice"), String::from(USER_FILTER_NONE)],
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert!(page.events.is_empty());
    assert!(!page.has_more);
    assert_eq!(page.total, Some(0));

    assert!(QueryService::event_types(&persistence, &query).unwrap().is_empty());
    assert!(QueryService::sessions(&persistence, &query.user_ids).unwrap().is_empty());
}

#[test]
fn test_user_filter_matches_user_name() {
    let persistence = test_persistence();
    seed_events(&persistence, 2, "tool_call", "alice");
    seed_events(&persistence, 3, "tool_call", "bob");

    let query = EventQuery {
        user_ids: vec![String::from("alice")],
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert_eq!(page.total, Some(2));
    assert!(page.events.iter().all(|e| e.user_name == "alice"));
}

#[test]
fn test_team_key_expands_to_org_keys() {
    let persistence = test_persistence();
    let teams = TeamService::new(512_000);
    let payments = teams.create_team(&persistence, "Payments", None, None).unwrap();
    teams.create_team(&persistence, "Billing", None, None).unwrap();
    TeamService::upsert_org(
        &persistence,
        &UpsertOrgRequest {
            org_id: String::from("Acme-West"),
            alias: None,
            color: None,
            team_id: Some(payments.id),
        },
    )
    .unwrap();

    ingest_json(
        &persistence,
        &json!({"eventType": "tool_call", "orgIdentifier": "acme-WEST"}),
    );
    ingest_json(
        &persistence,
        &json!({"eventType": "tool_call", "orgIdentifier": "other-org"}),
    );

    let query = EventQuery {
        team_key: Some(String::from("payments")),
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert_eq!(page.total, Some(1));
    assert_eq!(page.events[0].org_identifier, "acme-WEST");

    // A team with no orgs matches nothing rather than everything.
    let empty_team = EventQuery {
        team_key: Some(String::from("billing")),
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &empty_team).unwrap();
    assert!(page.events.is_empty());

    // So does an unknown team key.
    let unknown = EventQuery {
        team_key: Some(String::from("no-such-team")),
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &unknown).unwrap();
    assert!(page.events.is_empty());
}

#[test]
fn test_team_key_honors_legacy_mappings() {
    let persistence = test_persistence();
    let teams = TeamService::new(512_000);
    teams.create_team(&persistence, "Payments", None, None).unwrap();
    TeamService::replace_mappings(
        &persistence,
        vec![MappingDto {
            org_identifier: String::from("Acme-West"),
            client_name: String::from("Acme"),
            team_name: String::from("Payments"),
            color: String::new(),
            active: true,
        }],
    )
    .unwrap();

    ingest_json(
        &persistence,
        &json!({"eventType": "tool_call", "orgIdentifier": "ACME-west"}),
    );

    let query = EventQuery {
        team_key: Some(String::from("payments")),
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert_eq!(page.total, Some(1));
}

#[test]
fn test_event_types_counts_by_kind() {
    let persistence = test_persistence();
    seed_events(&persistence, 2, "tool_call", "alice");
    seed_events(&persistence, 1, "tool_error", "alice");

    let counts = QueryService::event_types(&persistence, &EventQuery::default()).unwrap();
    assert_eq!(counts.get("tool_call"), Some(&2));
    assert_eq!(counts.get("tool_error"), Some(&1));
}

#[test]
fn test_search_filters_the_page() {
    let persistence = test_persistence();
    ingest_json(
        &persistence,
        &json!({"eventType": "tool_call", "toolName": "Deploy Wizard"}),
    );
    ingest_json(
        &persistence,
        &json!({"eventType": "tool_call", "toolName": "other"}),
    );

    let query = EventQuery {
        search: Some(String::from("  deploy ")),
        ..EventQuery::default()
    };
    let page: EventsResponse = QueryService::events(&persistence, &query).unwrap();
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].tool_name, "Deploy Wizard");
}

#[test]
fn test_sessions_and_activity() {
    let persistence = test_persistence();
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-1"}));
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-1"}));
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-2"}));

    let sessions = QueryService::sessions(&persistence, &[]).unwrap();
    assert_eq!(sessions.len(), 2);
    let s1 = sessions.iter().find(|s| s.session_id == "s-1").unwrap();
    assert_eq!(s1.event_count, 2);

    let activity = QueryService::session_activity(&persistence, "s-1").unwrap();
    assert_eq!(activity.len(), 2);
    // Oldest first for the timeline.
    assert!(activity[0].id < activity[1].id);

    let all = QueryService::session_activity(&persistence, "all").unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn test_user_directories() {
    let persistence = test_persistence();
    seed_events(&persistence, 2, "tool_call", "alice");
    ingest_json(&persistence, &json!({"eventType": "tool_call"}));

    let event_users = QueryService::event_users(&persistence).unwrap();
    assert_eq!(event_users.len(), 1);
    assert_eq!(event_users[0].user_name, "alice");
    assert_eq!(event_users[0].count, 2);

    let telemetry_users = QueryService::telemetry_users(&persistence).unwrap();
    assert_eq!(telemetry_users.len(), 1);
    assert_eq!(telemetry_users[0].user_id, "uid-alice");
}

#[test]
fn test_delete_session_and_all_report_counts() {
    let persistence = test_persistence();
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-1"}));
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-1"}));
    ingest_json(&persistence, &json!({"eventType": "tool_call", "sessionId": "s-2"}));

    let deleted = QueryService::delete_session_events(&persistence, "s-1").unwrap();
    assert_eq!(deleted.deleted_count, 2);

    let deleted = QueryService::delete_all_events(&persistence).unwrap();
    assert_eq!(deleted.deleted_count, 1);

    let page: EventsResponse =
        QueryService::events(&persistence, &EventQuery::default()).unwrap();
    assert_eq!(page.total, Some(0));
}

#[test]
fn test_delete_event_rejects_unknown_id() {
    let persistence = test_persistence();
    let err = QueryService::delete_event(&persistence, 999).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert!(matches!(
        QueryService::event(&persistence, 999),
        Err(ApiError::NotFound { .. })
    ));
}
