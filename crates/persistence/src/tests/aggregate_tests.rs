// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for windowed aggregate counts.

use super::{make_event, test_persistence, ts, writer};
use crate::data_models::NewEvent;
use crate::queries::aggregates;
use crate::mutations;

fn insert_with_org(
    conn: &mut diesel::SqliteConnection,
    org: &str,
    user: &str,
    received_at: &str,
) {
    let mut event: NewEvent = make_event("tool_call", "s", user, received_at);
    event.org_identifier = org.to_string();
    event.org_identifier_key = org.trim().to_lowercase();
    mutations::events::insert_event(conn, &event).unwrap();
}

#[test]
fn test_count_events_between_is_half_open() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(1, 0)))
        .unwrap();
    mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(1, 23)))
        .unwrap();
    mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(2, 0)))
        .unwrap();

    let count: i64 =
        aggregates::count_events_between(&mut conn, &ts(1, 0), &ts(2, 0)).unwrap();
    assert_eq!(count, 2);
    assert_eq!(aggregates::count_all_events(&mut conn).unwrap(), 3);
}

#[test]
fn test_org_key_counts_sorted_descending_with_name_tiebreak() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    insert_with_org(&mut conn, "Globex", "a", &ts(3, 1));
    insert_with_org(&mut conn, "Globex", "a", &ts(3, 2));
    insert_with_org(&mut conn, "Acme", "a", &ts(3, 3));
    insert_with_org(&mut conn, "Initech", "a", &ts(3, 4));

    let counts = aggregates::org_key_counts(&mut conn).unwrap();
    assert_eq!(counts[0], (String::from("globex"), 2));
    // Equal counts fall back to lexicographic key order.
    assert_eq!(counts[1], (String::from("acme"), 1));
    assert_eq!(counts[2], (String::from("initech"), 1));
}

#[test]
fn test_org_key_counts_skip_blank_keys() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    insert_with_org(&mut conn, "", "a", &ts(4, 1));
    insert_with_org(&mut conn, "Acme", "a", &ts(4, 2));

    let counts = aggregates::org_key_counts(&mut conn).unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].0, "acme");
}

#[test]
fn test_windowed_org_and_user_counts() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    insert_with_org(&mut conn, "Acme", "alice", &ts(5, 1));
    insert_with_org(&mut conn, "Acme", "alice", &ts(5, 2));
    insert_with_org(&mut conn, "Globex", "bob", &ts(5, 3));
    insert_with_org(&mut conn, "Acme", "alice", &ts(6, 1)); // outside window

    let orgs = aggregates::org_key_counts_between(&mut conn, &ts(5, 0), &ts(6, 0)).unwrap();
    assert_eq!(orgs, vec![(String::from("acme"), 2), (String::from("globex"), 1)]);

    let users = aggregates::user_counts_between(&mut conn, &ts(5, 0), &ts(6, 0)).unwrap();
    assert_eq!(users, vec![(String::from("alice"), 2), (String::from("bob"), 1)]);
}

#[test]
fn test_error_count_between_counts_only_failures() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let mut failed: NewEvent = make_event("tool_error", "s", "a", &ts(7, 1));
    failed.success = 0;
    mutations::events::insert_event(&mut conn, &failed).unwrap();
    mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(7, 2)))
        .unwrap();

    let errors: i64 =
        aggregates::error_count_between(&mut conn, &ts(7, 0), &ts(8, 0)).unwrap();
    assert_eq!(errors, 1);
}
