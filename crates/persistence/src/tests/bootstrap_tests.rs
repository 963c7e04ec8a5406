// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for engine initialization: migrations, pragmas, template copy,
//! and database size reporting.

use super::{make_event, test_persistence, ts};
use crate::{Persistence, backend, mutations};

#[test]
fn test_in_memory_databases_are_isolated() {
    let first = Persistence::new_in_memory().unwrap();
    let second = Persistence::new_in_memory().unwrap();

    let mut conn = first.writer().unwrap();
    mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(1, 0)))
        .unwrap();
    drop(conn);

    let mut conn = second.reader().unwrap();
    let count: i64 = crate::queries::aggregates::count_all_events(&mut conn).unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_foreign_keys_are_enforced_on_pooled_connections() {
    let persistence = test_persistence();
    let mut conn = persistence.writer().unwrap();
    backend::verify_foreign_key_enforcement(&mut conn).unwrap();

    // A session for a nonexistent operator must be rejected.
    let result = mutations::sessions::create_session(
        &mut conn,
        "token",
        "csrf",
        "ghost",
        &ts(1, 0),
        &ts(2, 0),
        false,
    );
    assert!(result.is_err());
}

#[test]
fn test_readers_see_writer_commits() {
    let persistence = test_persistence();

    let mut w = persistence.writer().unwrap();
    mutations::events::insert_event(&mut w, &make_event("tool_call", "s", "a", &ts(1, 0)))
        .unwrap();
    drop(w);

    let mut r = persistence.reader().unwrap();
    assert_eq!(crate::queries::aggregates::count_all_events(&mut r).unwrap(), 1);
}

#[test]
fn test_file_database_reports_size_and_template_copy() {
    let dir = std::env::temp_dir().join(format!("toolscope_boot_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let template_path = dir.join("template.db");
    let db_path = dir.join("live.db");
    let _ = std::fs::remove_file(&template_path);
    let _ = std::fs::remove_file(&db_path);

    // Build a template containing one event.
    {
        let template = Persistence::new_with_file(&template_path, None).unwrap();
        let mut conn = template.writer().unwrap();
        mutations::events::insert_event(&mut conn, &make_event("tool_call", "s", "a", &ts(1, 0)))
            .unwrap();
    }

    // First boot copies the template into place.
    let persistence = Persistence::new_with_file(&db_path, Some(&template_path)).unwrap();
    let mut conn = persistence.reader().unwrap();
    assert_eq!(crate::queries::aggregates::count_all_events(&mut conn).unwrap(), 1);
    drop(conn);

    let (bytes, pct) = persistence.database_size(1024 * 1024).unwrap();
    assert!(bytes > 0);
    assert!(pct > 0.0);

    let _ = std::fs::remove_file(&template_path);
    let _ = std::fs::remove_file(&db_path);
}

#[test]
fn test_in_memory_database_size_is_zero() {
    let persistence = test_persistence();
    let (bytes, pct) = persistence.database_size(1024).unwrap();
    assert_eq!(bytes, 0);
    assert!((pct - 0.0).abs() < f64::EPSILON);
}

#[test]
fn test_migrations_are_idempotent() {
    let persistence = test_persistence();
    let mut conn = persistence.writer().unwrap();
    // Re-running on an up-to-date schema is a no-op.
    backend::run_migrations(&mut conn).unwrap();
}
