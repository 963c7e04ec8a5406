// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for operator administration and its safety guards.

use super::{TEST_HASH_COST, create_operator, test_actor, test_auth_service, test_persistence};
use crate::error::ApiError;
use crate::users::OperatorAdminService;
use toolscope_domain::Role;

fn service() -> OperatorAdminService {
    OperatorAdminService::new(TEST_HASH_COST)
}

#[test]
fn test_create_and_list_operators() {
    let persistence = test_persistence();
    let admin = test_actor("root", Role::Administrator);

    let created = service()
        .create(&persistence, &admin, "alice", "secret", "advanced", false)
        .unwrap();
    assert_eq!(created.username, "alice");
    assert_eq!(created.role, "advanced");
    assert!(!created.is_producer);

    let listed = OperatorAdminService::list(&persistence).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].username, "alice");
}

#[test]
fn test_create_rejects_bad_inputs_and_duplicates() {
    let persistence = test_persistence();
    let admin = test_actor("root", Role::Administrator);
    let svc = service();

    assert!(svc.create(&persistence, &admin, "has space", "pw", "basic", false).is_err());
    assert!(svc.create(&persistence, &admin, "alice", "pw", "overlord", false).is_err());
    assert!(matches!(
        svc.create(&persistence, &admin, "alice", "", "basic", false),
        Err(ApiError::InvalidInput { .. })
    ));

    svc.create(&persistence, &admin, "alice", "pw", "basic", false).unwrap();
    let err = svc
        .create(&persistence, &admin, "alice", "pw", "basic", false)
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict { .. }));
}

#[test]
fn test_only_god_grants_god() {
    let persistence = test_persistence();
    let admin = test_actor("root", Role::Administrator);
    let god = test_actor("overseer", Role::God);
    let svc = service();

    let err = svc
        .create(&persistence, &admin, "alice", "pw", "god", false)
        .unwrap_err();
    assert!(matches!(err, ApiError::RoleInsufficient { .. }));
    assert_eq!(err.code(), "role_insufficient");

    svc.create(&persistence, &god, "alice", "pw", "god", false).unwrap();

    // Non-god actors cannot touch the god account either.
    assert!(matches!(
        svc.set_password(&persistence, &admin, "alice", "new-pw"),
        Err(ApiError::RoleInsufficient { .. })
    ));
    assert!(matches!(
        OperatorAdminService::set_role(&persistence, &admin, "alice", "basic"),
        Err(ApiError::RoleInsufficient { .. })
    ));
    assert!(matches!(
        OperatorAdminService::delete(&persistence, &admin, "alice"),
        Err(ApiError::RoleInsufficient { .. })
    ));
}

#[test]
fn test_set_password_takes_effect_at_login() {
    let persistence = test_persistence();
    create_operator(&persistence, "alice", Role::Basic);
    let admin = test_actor("root", Role::Administrator);

    service().set_password(&persistence, &admin, "alice", "rotated").unwrap();

    let auth = test_auth_service();
    assert!(auth.login(&persistence, "alice", "password").is_err());
    assert!(auth.login(&persistence, "alice", "rotated").is_ok());
}

#[test]
fn test_set_role_refuses_demoting_the_last_admin() {
    let persistence = test_persistence();
    create_operator(&persistence, "root", Role::Administrator);
    let admin = test_actor("root", Role::Administrator);

    let err = OperatorAdminService::set_role(&persistence, &admin, "root", "basic").unwrap_err();
    assert!(matches!(err, ApiError::Conflict { .. }));

    // With a second admin present the demotion goes through.
    create_operator(&persistence, "backup", Role::Administrator);
    OperatorAdminService::set_role(&persistence, &admin, "root", "basic").unwrap();

    let listed = OperatorAdminService::list(&persistence).unwrap();
    let root = listed.iter().find(|o| o.username == "root").unwrap();
    assert_eq!(root.role, "basic");
}

#[test]
fn test_delete_refuses_self_and_last_admin() {
    let persistence = test_persistence();
    create_operator(&persistence, "root", Role::Administrator);
    create_operator(&persistence, "alice", Role::Basic);
    let admin = test_actor("root", Role::Administrator);

    assert!(matches!(
        OperatorAdminService::delete(&persistence, &admin, "root"),
        Err(ApiError::InvalidInput { .. })
    ));

    let other_admin = test_actor("other", Role::Administrator);
    let err = OperatorAdminService::delete(&persistence, &other_admin, "root").unwrap_err();
    assert!(matches!(err, ApiError::Conflict { .. }));

    OperatorAdminService::delete(&persistence, &admin, "alice").unwrap();
    assert!(matches!(
        OperatorAdminService::delete(&persistence, &admin, "alice"),
        Err(ApiError::NotFound { .. })
    ));
}

#[test]
fn test_god_counts_toward_the_admin_floor() {
    let persistence = test_persistence();
    create_operator(&persistence, "root", Role::Administrator);
    create_operator(&persistence, "overseer", Role::God);
    let god = test_actor("overseer", Role::God);

    // The god account keeps administration reachable, so the plain
    // administrator can go.
    OperatorAdminService::delete(&persistence, &god, "root").unwrap();

    // But the last authority cannot demote itself away.
    let err =
        OperatorAdminService::set_role(&persistence, &god, "overseer", "basic").unwrap_err();
    assert!(matches!(err, ApiError::Conflict { .. }));
}
