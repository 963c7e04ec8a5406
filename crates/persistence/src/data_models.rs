// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row structs mapped onto the Diesel schema.
//!
//! Field order inside each `Queryable` struct must match the column order
//! declared in `diesel_schema.rs`.

use diesel::prelude::*;

use crate::diesel_schema::{events, org_team_mappings};

/// A stored telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct EventRow {
    pub id: i64,
    pub received_at: String,
    pub event_time: String,
    pub event_kind: String,
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub server_id: String,
    pub version: String,
    pub area: String,
    pub tool_name: String,
    pub company_name: String,
    pub org_identifier: String,
    pub org_identifier_key: String,
    pub success: i32,
    pub error_message: String,
    pub data_json: String,
    pub created_at: String,
}

/// A new telemetry event awaiting insertion.
///
/// `received_at` is assigned by the server before insertion; `data_json`
/// carries the producer payload verbatim.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent {
    pub received_at: String,
    pub event_time: String,
    pub event_kind: String,
    pub session_id: String,
    pub user_id: String,
    pub user_name: String,
    pub server_id: String,
    pub version: String,
    pub area: String,
    pub tool_name: String,
    pub company_name: String,
    pub org_identifier: String,
    pub org_identifier_key: String,
    pub success: i32,
    pub error_message: String,
    pub data_json: String,
}

/// A dashboard operator.
///
/// The password hash never leaves the persistence and auth layers.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct OperatorRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
    pub last_login_at: Option<String>,
    pub is_producer: i32,
}

/// An authenticated session row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct SessionRow {
    pub id: i64,
    pub token: String,
    pub csrf_token: String,
    pub operator_username: String,
    pub issued_at: String,
    pub expires_at: String,
    pub created_at: String,
    pub csrf_exempt: i32,
}

/// A team row. The logo blob is loaded only by the logo query.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub logo: Option<Vec<u8>>,
    pub logo_mime: Option<String>,
    pub created_at: String,
}

/// An org row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct OrgRow {
    pub id: i64,
    pub org_id: String,
    pub alias: String,
    pub color: Option<String>,
    pub team_id: Option<i64>,
    pub created_at: String,
}

/// A legacy org->team mapping tuple.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct OrgTeamMappingRow {
    pub id: i64,
    pub org_identifier: String,
    pub client_name: String,
    pub team_name: String,
    pub color: String,
    pub active: i32,
    pub created_at: String,
}

/// A new legacy mapping tuple for the bulk-replace operation.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = org_team_mappings)]
pub struct NewOrgTeamMapping {
    pub org_identifier: String,
    pub client_name: String,
    pub team_name: String,
    pub color: String,
    pub active: i32,
}

/// An explicit event-user -> team link.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct EventUserTeamRow {
    pub id: i64,
    pub user_name: String,
    pub team_id: i64,
    pub created_at: String,
}
