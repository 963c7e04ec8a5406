// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod ingest_tests;
mod query_tests;
mod user_tests;

use toolscope_domain::Role;
use toolscope_persistence::{Persistence, mutations};

use crate::auth::{AuthService, CurrentOperator};
use crate::ingest::{IngestService, IngestedEvent};

/// Low bcrypt cost keeps the hashing tests fast.
pub const TEST_HASH_COST: u32 = 4;

pub fn test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

pub fn test_auth_service() -> AuthService {
    AuthService::new(3600, 2_592_000, TEST_HASH_COST)
}

pub fn test_ingest_service() -> IngestService {
    IngestService::new(262_144)
}

pub fn create_operator(persistence: &Persistence, username: &str, role: Role) {
    let mut conn = persistence.writer().unwrap();
    mutations::operators::create_operator(
        &mut conn,
        username,
        "password",
        role.as_str(),
        false,
        TEST_HASH_COST,
    )
    .unwrap();
}

pub fn test_actor(username: &str, role: Role) -> CurrentOperator {
    CurrentOperator {
        username: username.to_string(),
        role,
        is_producer: false,
        session_token: String::from("token"),
        csrf_token: String::from("csrf"),
        csrf_exempt: false,
    }
}

pub fn ingest_json(persistence: &Persistence, payload: &serde_json::Value) -> IngestedEvent {
    let body: Vec<u8> = serde_json::to_vec(payload).unwrap();
    test_ingest_service().ingest(persistence, &body).unwrap()
}
