// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for payload validation and normalization on the ingest path.

use serde_json::json;

use super::{ingest_json, test_ingest_service, test_persistence};
use crate::error::ApiError;
use crate::ingest::IngestService;
use crate::query::QueryService;
use crate::request_response::EventDto;

#[test]
fn test_ingest_assigns_id_and_received_at() {
    let persistence = test_persistence();
    let first = ingest_json(&persistence, &json!({"eventType": "tool_call"}));
    let second = ingest_json(&persistence, &json!({"eventType": "tool_call"}));

    assert!(second.id > first.id);
    assert!(!first.received_at.is_empty());

    let event: EventDto = QueryService::event(&persistence, first.id).unwrap();
    assert_eq!(event.received_at, first.received_at);
    // Missing client timestamp falls back to the receipt time.
    assert_eq!(event.timestamp, first.received_at);
    assert!(event.success);
}

#[test]
fn test_ingest_accepts_camel_and_snake_case_fields() {
    let persistence = test_persistence();
    let id = ingest_json(
        &persistence,
        &json!({
            "event_type": "tool_error",
            "session_id": "s-1",
            "toolName": "deploy",
            "companyName": "Acme",
            "errorMessage": "boom",
            "success": false
        }),
    )
    .id;

    let event: EventDto = QueryService::event(&persistence, id).unwrap();
    assert_eq!(event.event_kind, "tool_error");
    assert_eq!(event.session_id, "s-1");
    assert_eq!(event.tool_name, "deploy");
    assert_eq!(event.company_name, "Acme");
    assert_eq!(event.error_message, "boom");
    assert!(!event.success);
}

#[test]
fn test_ingest_rejects_unknown_kind() {
    let persistence = test_persistence();
    let body: Vec<u8> = serde_json::to_vec(&json!({"eventType": "reboot"})).unwrap();
    let err = test_ingest_service().ingest(&persistence, &body).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { .. }));
    assert_eq!(err.code(), "bad_request");
}

#[test]
fn test_ingest_rejects_bad_timestamp() {
    let persistence = test_persistence();
    let body: Vec<u8> =
        serde_json::to_vec(&json!({"eventType": "custom", "timestamp": "yesterday"})).unwrap();
    let err = test_ingest_service().ingest(&persistence, &body).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput { .. }));
}

#[test]
fn test_ingest_rejects_oversized_body() {
    let persistence = test_persistence();
    let service = IngestService {
        max_event_bytes: 64,
        data_max_bytes: 64,
    };
    let body: Vec<u8> =
        serde_json::to_vec(&json!({"eventType": "custom", "data": {"filler": "x".repeat(128)}}))
            .unwrap();
    let err = service.ingest(&persistence, &body).unwrap_err();
    assert!(matches!(err, ApiError::PayloadTooLarge { limit: 64 }));
}

#[test]
fn test_ingest_rejects_oversized_data_payload() {
    let persistence = test_persistence();
    let service = IngestService {
        max_event_bytes: 1024 * 1024,
        data_max_bytes: 32,
    };
    let body: Vec<u8> =
        serde_json::to_vec(&json!({"eventType": "custom", "data": {"filler": "x".repeat(64)}}))
            .unwrap();
    let err = service.ingest(&persistence, &body).unwrap_err();
    assert!(matches!(err, ApiError::PayloadTooLarge { limit: 32 }));
}

#[test]
fn test_user_name_derivation_order() {
    let persistence = test_persistence();

    // Nested user.name wins over everything.
    let nested = ingest_json(
        &persistence,
        &json!({
            "eventType": "custom",
            "user": {"name": "Alice A", "id": "u-1"},
            "userName": "flat-name",
            "userId": "u-2"
        }),
    );
    // Flat name is next.
    let flat = ingest_json(
        &persistence,
        &json!({"eventType": "custom", "user_name": "Bob", "userId": "u-3"}),
    );
    // The ID is the label of last resort.
    let id_only = ingest_json(&persistence, &json!({"eventType": "custom", "userId": "u-4"}));

    assert_eq!(QueryService::event(&persistence, nested.id).unwrap().user_name, "Alice A");
    assert_eq!(QueryService::event(&persistence, flat.id).unwrap().user_name, "Bob");
    assert_eq!(QueryService::event(&persistence, id_only.id).unwrap().user_name, "u-4");
}

#[test]
fn test_org_identifier_from_nested_data_and_normalization() {
    let persistence = test_persistence();
    let id = ingest_json(
        &persistence,
        &json!({
            "eventType": "tool_call",
            "data": {"state": {"org": {"id": "  00Dxx0000001  "}}}
        }),
    )
    .id;

    let event: EventDto = QueryService::event(&persistence, id).unwrap();
    assert_eq!(event.org_identifier, "00Dxx0000001");

    // The explicit field wins over the nested path.
    let explicit = ingest_json(
        &persistence,
        &json!({
            "eventType": "tool_call",
            "orgIdentifier": "Acme-West",
            "data": {"state": {"org": {"id": "ignored"}}}
        }),
    );
    let event: EventDto = QueryService::event(&persistence, explicit.id).unwrap();
    assert_eq!(event.org_identifier, "Acme-West");
}

#[test]
fn test_data_payload_round_trips_exactly() {
    let persistence = test_persistence();
    let data = json!({
        "state": {"org": {"id": "00Dxx"}},
        "metrics": [1, 2, 3],
        "nested": {"unicode": "héllo", "flag": true}
    });
    let id = ingest_json(&persistence, &json!({"eventType": "custom", "data": data})).id;

    let event: EventDto = QueryService::event(&persistence, id).unwrap();
    assert_eq!(event.data, data);
}

#[test]
fn test_strings_are_trimmed() {
    let persistence = test_persistence();
    let id = ingest_json(
        &persistence,
        &json!({
            "eventType": "  tool_call  ",
            "sessionId": "  s-9  ",
            "area": "  editor "
        }),
    )
    .id;

    let event: EventDto = QueryService::event(&persistence, id).unwrap();
    assert_eq!(event.event_kind, "tool_call");
    assert_eq!(event.session_id, "s-9");
    assert_eq!(event.area, "editor");
}
