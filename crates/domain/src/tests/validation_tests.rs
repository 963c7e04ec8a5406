// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{validate_limit, validate_team_name, validate_username};

#[test]
fn test_validate_limit_boundaries() {
    assert!(validate_limit(0).is_err());
    assert_eq!(validate_limit(1).unwrap(), 1);
    assert_eq!(validate_limit(500).unwrap(), 500);
    assert!(validate_limit(501).is_err());
    assert!(validate_limit(-1).is_err());
}

#[test]
fn test_validate_team_name_trims_and_accepts() {
    assert_eq!(validate_team_name("  Platform  ").unwrap(), "Platform");
}

#[test]
fn test_validate_team_name_rejects_empty_and_oversized() {
    assert!(validate_team_name("   ").is_err());
    let long: String = "x".repeat(129);
    assert!(validate_team_name(&long).is_err());
}

#[test]
fn test_validate_username_rejects_whitespace() {
    assert!(validate_username("god").is_ok());
    assert!(validate_username("a b").is_err());
    assert!(validate_username("").is_err());
    let long: String = "u".repeat(65);
    assert!(validate_username(&long).is_err());
}
