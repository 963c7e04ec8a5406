// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod aggregate_tests;
mod bootstrap_tests;
mod operator_tests;
mod team_tests;

use crate::data_models::NewEvent;
use crate::{DbConnection, Persistence};

/// Low bcrypt cost keeps the hashing tests fast.
pub const TEST_HASH_COST: u32 = 4;

pub fn test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

pub fn writer(persistence: &Persistence) -> DbConnection {
    persistence.writer().unwrap()
}

/// Fixed-width ISO-8601 timestamp inside August 2026.
pub fn ts(day: u8, hour: u8) -> String {
    format!("2026-08-{day:02}T{hour:02}:00:00.000000000Z")
}

pub fn make_event(kind: &str, session_id: &str, user_name: &str, received_at: &str) -> NewEvent {
    NewEvent {
        received_at: received_at.to_string(),
        event_time: received_at.to_string(),
        event_kind: kind.to_string(),
        session_id: session_id.to_string(),
        user_id: format!("id-{user_name}"),
        user_name: user_name.to_string(),
        server_id: String::from("srv-1"),
        version: String::from("1.0.0"),
        area: String::from("editor"),
        tool_name: String::from("refactor"),
        company_name: String::from("Acme"),
        org_identifier: String::from("Acme-West"),
        org_identifier_key: String::from("acme-west"),
        success: 1,
        error_message: String::new(),
        data_json: String::from("{}"),
    }
}
