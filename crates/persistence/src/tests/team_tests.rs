// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for team and org persistence, including referential actions on
//! team deletion.

use super::{test_persistence, writer};
use crate::data_models::OrgRow;
use crate::queries::{mappings, orgs, teams};
use crate::{PersistenceError, mutations};

#[test]
fn test_create_team_and_lookup_by_name_is_case_insensitive() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let team = mutations::teams::create_team(&mut conn, "Platform", Some("#ff0000")).unwrap();
    assert_eq!(team.name, "Platform");
    assert_eq!(team.color.as_deref(), Some("#ff0000"));

    let found = teams::get_team_by_name(&mut conn, "platform").unwrap();
    assert_eq!(found.id, team.id);
}

#[test]
fn test_duplicate_team_name_conflicts_case_insensitively() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    mutations::teams::create_team(&mut conn, "Platform", None).unwrap();
    let result = mutations::teams::create_team(&mut conn, "PLATFORM", None);
    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_update_team_name_and_color() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let team = mutations::teams::create_team(&mut conn, "Platform", Some("#ff0000")).unwrap();
    let updated =
        mutations::teams::update_team(&mut conn, team.id, Some("Core"), Some(None)).unwrap();
    assert_eq!(updated.name, "Core");
    assert_eq!(updated.color, None);
}

#[test]
fn test_team_logo_round_trip_and_clear() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let team = mutations::teams::create_team(&mut conn, "Platform", None).unwrap();
    assert!(teams::get_team_logo(&mut conn, team.id).is_err());

    let png: Vec<u8> = vec![0x89, 0x50, 0x4e, 0x47];
    mutations::teams::set_team_logo(&mut conn, team.id, &png, "image/png").unwrap();

    let (logo, mime) = teams::get_team_logo(&mut conn, team.id).unwrap();
    assert_eq!(logo, png);
    assert_eq!(mime, "image/png");

    // Listings never carry the blob.
    let listing = teams::get_team(&mut conn, team.id).unwrap();
    assert_eq!(listing.logo_mime.as_deref(), Some("image/png"));

    mutations::teams::clear_team_logo(&mut conn, team.id).unwrap();
    assert!(teams::get_team_logo(&mut conn, team.id).is_err());
}

#[test]
fn test_create_org_and_duplicate_identifier_conflicts() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let org: OrgRow = mutations::orgs::create_org(&mut conn, "Acme-West", "West", None).unwrap();
    assert_eq!(org.org_id, "Acme-West");
    assert_eq!(org.alias, "West");

    let result = mutations::orgs::create_org(&mut conn, "acme-west", "", None);
    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_assign_org_team_and_detach() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let team = mutations::teams::create_team(&mut conn, "Platform", None).unwrap();
    let org = mutations::orgs::create_org(&mut conn, "Acme", "", None).unwrap();

    let assigned = mutations::orgs::assign_org_team(&mut conn, org.id, Some(team.id)).unwrap();
    assert_eq!(assigned.team_id, Some(team.id));

    let listed = orgs::list_orgs_for_team(&mut conn, team.id).unwrap();
    assert_eq!(listed.len(), 1);

    let detached = mutations::orgs::assign_org_team(&mut conn, org.id, None).unwrap();
    assert_eq!(detached.team_id, None);
}

#[test]
fn test_assign_org_to_missing_team_fails() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let org = mutations::orgs::create_org(&mut conn, "Acme", "", None).unwrap();
    let result = mutations::orgs::assign_org_team(&mut conn, org.id, Some(9999));
    assert!(result.is_err());
}

#[test]
fn test_delete_team_detaches_orgs_and_drops_user_links() {
    let persistence = test_persistence();
    let mut conn = writer(&persistence);

    let team = mutations::teams::create_team(&mut conn, "Platform", None).unwrap();
    let org = mutations::orgs::create_org(&mut conn, "Acme", "", None).unwrap();
    mutations::orgs::assign_org_team(&mut conn, org.id, Some(team.id)).unwrap();
    mutations::mappings::set_event_user_team(&mut conn, "alice", team.id).unwrap();

    mutations::teams::delete_team(&mut conn, team.id).unwrap();

    // Org survives with its assignment nulled out.
    let org = orgs::get_org(&mut conn, org.id).unwrap();
    assert_eq!(org.team_id, None);
    // Explicit user links cascade away.
    assert!(mappings::list_event_user_teams(&mut conn).unwrap().is_empty());
}
