// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Wire-facing request and response data transfer objects.
//!
//! Responses serialize in camelCase to match the dashboard client. The
//! success/error envelope is applied by the HTTP layer, not here.

use serde::{Deserialize, Serialize};
use toolscope_persistence::{
    EventRow, OperatorRow, OrgRow, OrgTeamMappingRow,
};

/// A stored event as returned over the wire. The `data` field carries the
/// producer payload exactly as posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: i64,
    pub received_at: String,
    pub timestamp: String,
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
    pub success: bool,
    pub error_message: String,
    pub data: serde_json::Value,
}

impl From<EventRow> for EventDto {
    fn from(row: EventRow) -> Self {
        let data: serde_json::Value = if row.data_json.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&row.data_json).unwrap_or(serde_json::Value::Null)
        };
        Self {
            id: row.id,
            received_at: row.received_at,
            timestamp: row.event_time,
            event_kind: row.event_kind,
            session_id: row.session_id,
            user_id: row.user_id,
            user_name: row.user_name,
            server_id: row.server_id,
            version: row.version,
            area: row.area,
            tool_name: row.tool_name,
            company_name: row.company_name,
            org_identifier: row.org_identifier,
            success: row.success != 0,
            error_message: row.error_message,
            data,
        }
    }
}

/// One page of queried events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<EventDto>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl EventsResponse {
    /// The canonical empty page, used by the `__none__` sentinel path.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            events: Vec::new(),
            has_more: false,
            total: Some(0),
        }
    }
}

/// The response to a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub id: i64,
    pub received_at: String,
}

/// A bulk-delete result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountResponse {
    pub deleted_count: i64,
}

/// A materialized telemetry session summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryDto {
    pub session_id: String,
    pub first_event: String,
    pub last_event: String,
    pub event_count: i64,
    pub user_id: String,
    pub user_name: String,
}

/// A distinct event user with activity stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUserDto {
    pub user_name: String,
    pub count: i64,
    pub last_seen: String,
}

/// A distinct `(user_id, user_name)` pair for the filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryUserDto {
    pub user_id: String,
    pub user_name: String,
    pub count: i64,
}

/// A team without its logo blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub has_logo: bool,
    pub created_at: String,
}

/// Per-team aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatsDto {
    pub team_id: i64,
    pub name: String,
    pub color: Option<String>,
    pub event_count: i64,
    pub active_mappings: i64,
    pub inactive_mappings: i64,
    pub orgs: Vec<String>,
    pub clients: Vec<String>,
}

/// An org with its optional team assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgDto {
    pub id: i64,
    pub org_id: String,
    pub alias: String,
    pub color: Option<String>,
    pub team_id: Option<i64>,
}

impl From<OrgRow> for OrgDto {
    fn from(row: OrgRow) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            alias: row.alias,
            color: row.color,
            team_id: row.team_id,
        }
    }
}

/// A legacy org->team mapping tuple, round-tripped by the settings UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDto {
    pub org_identifier: String,
    #[serde(default)]
    pub client_name: String,
    pub team_name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

impl From<OrgTeamMappingRow> for MappingDto {
    fn from(row: OrgTeamMappingRow) -> Self {
        Self {
            org_identifier: row.org_identifier,
            client_name: row.client_name,
            team_name: row.team_name,
            color: row.color,
            active: row.active != 0,
        }
    }
}

/// An event-user -> team link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUserTeamDto {
    pub user_name: String,
    pub team_id: i64,
}

/// An operator account. The password hash never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDto {
    pub username: String,
    pub role: String,
    pub is_producer: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<OperatorRow> for OperatorDto {
    fn from(row: OperatorRow) -> Self {
        Self {
            username: row.username,
            role: row.role,
            is_producer: row.is_producer != 0,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}

/// One calendar day of event counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCountDto {
    /// The day in `YYYY-MM-DD` form, server-local.
    pub date: String,
    pub count: i64,
    pub error_count: i64,
}

/// One top-N leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopEntryDto {
    pub name: String,
    pub count: i64,
}

/// Database file size against the configured limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSizeDto {
    pub bytes: u64,
    pub pct_of_limit: f64,
    /// `ok`, `warning`, or `critical` against the configured thresholds.
    pub status: String,
}

/// The authentication status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusDto {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Login credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Operator creation payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub is_producer: bool,
}

/// Password change payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

/// Role change payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// Org upsert payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOrgRequest {
    #[serde(alias = "id")]
    pub org_id: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub team_id: Option<i64>,
}

/// Org move payload. A missing or null `teamId` detaches the org.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOrgRequest {
    #[serde(default)]
    pub team_id: Option<i64>,
}

/// Event-user team link payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventUserRequest {
    pub user_name: String,
}
