// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for operator account persistence.

use super::{TEST_HASH_COST, test_persistence, ts, writer};
use crate::data_models::OperatorRow;
use crate::queries::operators;
use crate::{PersistenceError, mutations};

#[test]
fn test_create_operator_hashes_password() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let operator: OperatorRow = mutations::operators::create_operator(
        &mut conn,
        "alice",
        "hunter2",
        "advanced",
        false,
        TEST_HASH_COST,
    )
    .unwrap();

    assert_eq!(operator.username, "alice");
    assert_eq!(operator.role, "advanced");
    assert_eq!(operator.is_producer, 0);
    assert_ne!(operator.password_hash, "hunter2");
    assert!(operators::verify_password(&operator, "hunter2").unwrap());
    assert!(!operators::verify_password(&operator, "wrong").unwrap());
}

#[test]
fn test_create_duplicate_operator_conflicts() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "alice", "pw", "basic", false, TEST_HASH_COST)
        .unwrap();
    let result = mutations::operators::create_operator(
        &mut conn,
        "alice",
        "pw2",
        "basic",
        false,
        TEST_HASH_COST,
    );
    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_seed_default_operator_only_when_empty() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    assert!(mutations::operators::seed_default_operator(&mut conn, TEST_HASH_COST).unwrap());
    // Second boot is a no-op.
    assert!(!mutations::operators::seed_default_operator(&mut conn, TEST_HASH_COST).unwrap());

    let god: OperatorRow = operators::get_operator_by_username(&mut conn, "god").unwrap();
    assert_eq!(god.role, "god");
    assert!(operators::verify_password(&god, "god").unwrap());
}

#[test]
fn test_seed_skipped_when_operators_exist() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "admin", "pw", "administrator", false, TEST_HASH_COST)
        .unwrap();
    assert!(!mutations::operators::seed_default_operator(&mut conn, TEST_HASH_COST).unwrap());
    assert!(matches!(
        operators::get_operator_by_username(&mut conn, "god"),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_update_password_and_role() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "alice", "old", "basic", false, TEST_HASH_COST)
        .unwrap();
    mutations::operators::update_operator_password(&mut conn, "alice", "new", TEST_HASH_COST)
        .unwrap();
    mutations::operators::update_operator_role(&mut conn, "alice", "administrator").unwrap();

    let alice: OperatorRow = operators::get_operator_by_username(&mut conn, "alice").unwrap();
    assert_eq!(alice.role, "administrator");
    assert!(operators::verify_password(&alice, "new").unwrap());
    assert!(!operators::verify_password(&alice, "old").unwrap());
}

#[test]
fn test_count_admins_includes_god() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "root", "pw", "god", false, TEST_HASH_COST)
        .unwrap();
    mutations::operators::create_operator(&mut conn, "ops", "pw", "administrator", false, TEST_HASH_COST)
        .unwrap();
    mutations::operators::create_operator(&mut conn, "viewer", "pw", "basic", false, TEST_HASH_COST)
        .unwrap();

    assert_eq!(operators::count_admins(&mut conn).unwrap(), 2);
    assert_eq!(operators::count_operators(&mut conn).unwrap(), 3);
}

#[test]
fn test_delete_operator_cascades_sessions() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "alice", "pw", "basic", false, TEST_HASH_COST)
        .unwrap();
    mutations::sessions::create_session(
        &mut conn,
        "token-1",
        "csrf-1",
        "alice",
        &ts(1, 0),
        &ts(2, 0),
        false,
    )
    .unwrap();

    mutations::operators::delete_operator(&mut conn, "alice").unwrap();

    assert_eq!(crate::queries::sessions::count_sessions(&mut conn).unwrap(), 0);
    assert!(matches!(
        mutations::operators::delete_operator(&mut conn, "alice"),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_touch_last_login() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::operators::create_operator(&mut conn, "alice", "pw", "basic", false, TEST_HASH_COST)
        .unwrap();
    mutations::operators::touch_last_login(&mut conn, "alice", &ts(1, 12)).unwrap();

    let alice: OperatorRow = operators::get_operator_by_username(&mut conn, "alice").unwrap();
    assert_eq!(alice.last_login_at, Some(ts(1, 12)));
}
