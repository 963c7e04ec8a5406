// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP server for the Toolscope telemetry viewer.
//!
//! This binary owns the wire surface and the process lifecycle: config,
//! router construction, the session/CSRF guard, backpressure and
//! per-request deadlines, the periodic session cleaner, and graceful
//! shutdown. All business rules live in `toolscope-api`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]
// Handlers must be async for axum whether or not they await.
#![allow(clippy::unused_async)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State as AxumState},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use clap::Parser;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tracing::{error, info, warn};

use toolscope_api::{
    ApiError, AuthService, CurrentOperator, EventQuery, IngestService, OperatorAdminService,
    QueryService, StatsService, TeamService,
};
use toolscope_api::auth::LoginOutcome;
use toolscope_api::ingest::IngestedEvent;
use toolscope_api::request_response::{
    AddEventUserRequest, AuthStatusDto, CreateUserRequest, LoginRequest, MappingDto,
    MoveOrgRequest, SetPasswordRequest, SetRoleRequest, UpsertOrgRequest,
};
use toolscope_api::stats::DEFAULT_DAILY_STATS_DAYS;
use toolscope_api::teams::{LogoUpload, UpdateTeamInput};
use toolscope_domain::Role;
use toolscope_persistence::{Persistence, mutations};

mod routes;
mod session;


use session::{CSRF_COOKIE, MaybeOperator, SESSION_COOKIE};

/// Toolscope Server - self-hosted telemetry viewer backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the listener to.
    #[arg(long, env = "LISTEN_ADDRESS", default_value = "127.0.0.1:8080")]
    listen_address: String,

    /// Path to the `SQLite` database file.
    #[arg(long, env = "DB_PATH", default_value = "toolscope.db")]
    database_path: PathBuf,

    /// Template database copied into place when the database file does
    /// not exist yet.
    #[arg(long, env = "INITIAL_TEMPLATE_DB_PATH")]
    initial_template_path: Option<PathBuf>,

    /// TTL for interactive operator sessions, in seconds.
    #[arg(long, env = "SESSION_TTL_SECONDS", default_value_t = 86_400)]
    session_ttl_seconds: i64,

    /// TTL for machine-producer sessions, in seconds.
    #[arg(long, env = "PRODUCER_SESSION_TTL_SECONDS", default_value_t = 2_592_000)]
    producer_session_ttl_seconds: i64,

    /// Cap on an ingested event body, in bytes.
    #[arg(long, env = "MAX_EVENT_BYTES", default_value_t = 262_144)]
    max_event_bytes: usize,

    /// Cap on a team logo upload, in bytes.
    #[arg(long, env = "LOGO_MAX_BYTES", default_value_t = 512_000)]
    logo_max_bytes: usize,

    /// Database size limit the gauge is measured against, in bytes.
    #[arg(long, env = "DB_MAX_BYTES", default_value_t = 1_073_741_824)]
    db_max_bytes: u64,

    /// Warning threshold as a percentage of the database size limit.
    #[arg(long, env = "DB_SIZE_WARN_PCT", default_value_t = 70.0)]
    db_size_warn_pct: f64,

    /// Critical threshold as a percentage of the database size limit.
    #[arg(long, env = "DB_SIZE_CRIT_PCT", default_value_t = 80.0)]
    db_size_crit_pct: f64,

    /// bcrypt cost for operator password hashes.
    #[arg(long, env = "PASSWORD_HASH_COST", default_value_t = 12)]
    password_hash_cost: u32,

    /// Bound on concurrently served requests.
    #[arg(long, env = "MAX_CONCURRENT_REQUESTS", default_value_t = 256)]
    max_concurrent_requests: usize,

    /// Per-request deadline, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 30)]
    request_timeout_seconds: u64,

    /// Drain window after a shutdown signal, in seconds.
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 10)]
    shutdown_grace_seconds: u64,

    /// Mark session and CSRF cookies as Secure.
    #[arg(long, env = "SECURE_COOKIES", default_value_t = false)]
    secure_cookies: bool,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage engine.
    pub persistence: Arc<Persistence>,
    /// Session issuance and validation.
    pub auth: AuthService,
    /// Event payload validation and persistence.
    pub ingest: IngestService,
    /// Team, org, and mapping management.
    pub teams: TeamService,
    /// Aggregate views.
    pub stats: StatsService,
    /// Operator administration.
    pub users: OperatorAdminService,
    /// Concurrent-request bound.
    pub limiter: Arc<Semaphore>,
    /// Per-request deadline.
    pub request_timeout: Duration,
    /// Whether cookies carry the Secure attribute.
    pub secure_cookies: bool,
}

/// HTTP error wrapper carrying the stable wire code.
pub struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The stable error code.
    code: &'static str,
    /// The human-readable message.
    message: String,
}

impl HttpError {
    fn bad_request(field: &str, message: &str) -> Self {
        Self::from(ApiError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        })
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<Value> = Json(json!({
            "status": "error",
            "code": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::CsrfMismatch | ApiError::RoleInsufficient { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Internal error");
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Serializes a value and merges `"status": "ok"` into its object form.
fn ok_merge<T: serde::Serialize>(value: &T) -> Result<Json<Value>, HttpError> {
    let mut value: Value = serde_json::to_value(value).map_err(|e| {
        HttpError::from(ApiError::Internal {
            message: format!("Response serialization failed: {e}"),
        })
    })?;
    if let Some(map) = value.as_object_mut() {
        map.insert(String::from("status"), Value::from("ok"));
        return Ok(Json(value));
    }
    Err(HttpError::from(ApiError::Internal {
        message: String::from("Response envelope requires an object payload"),
    }))
}

/// Parses the event query-string conventions: repeated params are
/// OR-sets, pagination via `limit`/`offset`, ordering via
/// `orderBy`/`order`.
fn parse_event_query(params: &[(String, String)]) -> Result<EventQuery, HttpError> {
    let mut query: EventQuery = EventQuery::default();
    for (key, value) in params {
        match key.as_str() {
            "type" | "eventType" => query.kinds.push(value.clone()),
            "sessionId" => query.session_id = Some(value.clone()),
            "userId" => query.user_ids.push(value.clone()),
            "search" => query.search = Some(value.clone()),
            "from" => query.from = Some(value.clone()),
            "to" => query.to = Some(value.clone()),
            "team" => query.team_key = Some(value.clone()),
            "limit" => {
                query.limit = Some(value.parse().map_err(|_| {
                    HttpError::bad_request("limit", "Limit must be an integer")
                })?);
            }
            "offset" => {
                query.offset = Some(value.parse().map_err(|_| {
                    HttpError::bad_request("offset", "Offset must be an integer")
                })?);
            }
            "order" => {
                query.descending = match value.as_str() {
                    "desc" => true,
                    "asc" => false,
                    _ => {
                        return Err(HttpError::bad_request(
                            "order",
                            "Order must be 'asc' or 'desc'",
                        ));
                    }
                };
            }
            "orderBy" => {
                if value != "received_at" && value != "receivedAt" {
                    return Err(HttpError::bad_request(
                        "orderBy",
                        "Events can only be ordered by received_at",
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(query)
}

/// Handler for POST /login.
///
/// Issues the session and CSRF cookies. The CSRF token is additionally
/// echoed in the body so non-browser clients can pick it up.
async fn handle_login(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, HttpError> {
    let outcome: LoginOutcome =
        state
            .auth
            .login(&state.persistence, req.username.trim(), &req.password)?;

    let ttl_seconds: i64 = if outcome.session.csrf_exempt == 0 {
        state.auth.session_ttl.whole_seconds()
    } else {
        state.auth.producer_session_ttl.whole_seconds()
    };
    let secure: &str = if state.secure_cookies { "; Secure" } else { "" };
    let session_cookie: String = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}{secure}",
        outcome.session.token
    );
    // Script-readable on purpose: the dashboard reflects it into the
    // CSRF header on every mutation.
    let csrf_cookie: String = format!(
        "{CSRF_COOKIE}={}; Path=/; SameSite=Lax; Max-Age={ttl_seconds}{secure}",
        outcome.session.csrf_token
    );

    let body: Json<Value> = Json(json!({
        "status": "ok",
        "username": outcome.session.operator_username,
        "role": outcome.role.as_str(),
        "csrfToken": outcome.session.csrf_token,
    }));
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, csrf_cookie),
        ]),
        body,
    )
        .into_response())
}

/// Handler for POST /logout.
async fn handle_logout(
    AxumState(state): AxumState<AppState>,
    axum::Extension(operator): axum::Extension<CurrentOperator>,
) -> Result<Response, HttpError> {
    AuthService::logout(&state.persistence, &operator.session_token)?;
    let expired_session: String =
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    let expired_csrf: String = format!("{CSRF_COOKIE}=; Path=/; SameSite=Lax; Max-Age=0");
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, expired_session),
            (header::SET_COOKIE, expired_csrf),
        ]),
        Json(json!({"status": "ok"})),
    )
        .into_response())
}

/// Handler for GET /api/auth/status.
async fn handle_auth_status(
    axum::Extension(MaybeOperator(operator)): axum::Extension<MaybeOperator>,
) -> Result<Json<Value>, HttpError> {
    let status: AuthStatusDto = match operator {
        Some(operator) => AuthStatusDto {
            authenticated: true,
            username: Some(operator.username),
            role: Some(operator.role.as_str().to_string()),
        },
        None => AuthStatusDto {
            authenticated: false,
            username: None,
            role: None,
        },
    };
    ok_merge(&status)
}

/// Handler for POST /events.
async fn handle_ingest(
    AxumState(state): AxumState<AppState>,
    body: Bytes,
) -> Result<Json<Value>, HttpError> {
    let ingested: IngestedEvent = state.ingest.ingest(&state.persistence, &body)?;
    Ok(Json(json!({
        "status": "ok",
        "id": ingested.id,
        "receivedAt": ingested.received_at,
    })))
}

/// Handler for GET /api/events.
async fn handle_list_events(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, HttpError> {
    let query: EventQuery = parse_event_query(&params)?;
    ok_merge(&QueryService::events(&state.persistence, &query)?)
}

/// Handler for GET /api/events/{id}.
async fn handle_get_event(
    AxumState(state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    let event = QueryService::event(&state.persistence, event_id)?;
    Ok(Json(json!({"status": "ok", "event": event})))
}

/// Handler for DELETE /api/events/{id}.
async fn handle_delete_event(
    AxumState(state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    QueryService::delete_event(&state.persistence, event_id)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Query parameters for DELETE /api/events.
#[derive(Debug, Deserialize)]
struct DeleteEventsParams {
    /// Restricts the delete to one telemetry session.
    #[serde(default, rename = "sessionId")]
    session_id: Option<String>,
}

/// Handler for DELETE /api/events.
///
/// With a `sessionId` this deletes one session's events; without one it
/// deletes everything, which additionally requires the advanced role.
async fn handle_delete_events(
    AxumState(state): AxumState<AppState>,
    axum::Extension(operator): axum::Extension<CurrentOperator>,
    Query(params): Query<DeleteEventsParams>,
) -> Result<Json<Value>, HttpError> {
    let deleted = match params.session_id.as_deref() {
        Some(session_id) => QueryService::delete_session_events(&state.persistence, session_id)?,
        None => {
            if !operator.satisfies(Role::Advanced) {
                return Err(HttpError::from(ApiError::RoleInsufficient {
                    required: Role::Advanced.as_str().to_string(),
                }));
            }
            info!(username = %operator.username, "Deleting all events");
            QueryService::delete_all_events(&state.persistence)?
        }
    };
    ok_merge(&deleted)
}

/// Handler for GET /api/sessions.
async fn handle_list_sessions(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, HttpError> {
    let user_ids: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "userId")
        .map(|(_, value)| value)
        .collect();
    let sessions = QueryService::sessions(&state.persistence, &user_ids)?;
    Ok(Json(json!({"status": "ok", "sessions": sessions})))
}

/// Handler for GET /api/sessions/{session_id}/activity.
async fn handle_session_activity(
    AxumState(state): AxumState<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let events = QueryService::session_activity(&state.persistence, &session_id)?;
    Ok(Json(json!({"status": "ok", "events": events})))
}

/// Handler for GET /api/event-types.
async fn handle_event_types(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, HttpError> {
    let query: EventQuery = parse_event_query(&params)?;
    let counts = QueryService::event_types(&state.persistence, &query)?;
    Ok(Json(json!({"status": "ok", "counts": counts})))
}

/// Handler for GET /api/telemetry-users.
async fn handle_telemetry_users(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let users = QueryService::telemetry_users(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "users": users})))
}

/// Handler for GET /api/event-users.
///
/// Joins the distinct event users with their team links for the mapping
/// UI.
async fn handle_event_users(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let users = QueryService::event_users(&state.persistence)?;
    let links = TeamService::list_event_user_teams(&state.persistence)?;
    let team_by_user: HashMap<String, i64> = links
        .into_iter()
        .map(|link| (link.user_name, link.team_id))
        .collect();
    let users: Vec<Value> = users
        .into_iter()
        .map(|user| {
            json!({
                "userName": user.user_name,
                "count": user.count,
                "lastSeen": user.last_seen,
                "teamId": team_by_user.get(&user.user_name),
            })
        })
        .collect();
    Ok(Json(json!({"status": "ok", "users": users})))
}

/// Handler for GET /api/team-stats.
async fn handle_team_stats(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let teams = StatsService::team_stats(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "teams": teams})))
}

/// Query parameters for GET /api/daily-stats.
#[derive(Debug, Deserialize)]
struct DailyStatsParams {
    /// Trailing window length in days.
    #[serde(default)]
    days: Option<u32>,
}

/// Handler for GET /api/daily-stats.
async fn handle_daily_stats(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<DailyStatsParams>,
) -> Result<Json<Value>, HttpError> {
    let days: u32 = params.days.unwrap_or(DEFAULT_DAILY_STATS_DAYS).min(366);
    if days == 0 {
        return Err(HttpError::bad_request("days", "Days must be at least 1"));
    }
    let days = state.stats.daily_stats(&state.persistence, days)?;
    Ok(Json(json!({"status": "ok", "days": days})))
}

/// Query parameters for the top-N endpoints.
#[derive(Debug, Deserialize)]
struct TopParams {
    /// Number of entries to return.
    #[serde(default)]
    n: Option<usize>,
}

/// Default leaderboard length.
const DEFAULT_TOP_N: usize = 10;

/// Handler for GET /api/top-teams-today.
async fn handle_top_teams_today(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<Value>, HttpError> {
    let entries = state
        .stats
        .top_teams_today(&state.persistence, params.n.unwrap_or(DEFAULT_TOP_N))?;
    Ok(Json(json!({"status": "ok", "teams": entries})))
}

/// Handler for GET /api/top-users-today.
async fn handle_top_users_today(
    AxumState(state): AxumState<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<Value>, HttpError> {
    let entries = state
        .stats
        .top_users_today(&state.persistence, params.n.unwrap_or(DEFAULT_TOP_N))?;
    Ok(Json(json!({"status": "ok", "users": entries})))
}

/// Handler for GET /api/database-size.
///
/// The gauge is nested because its own `status` field (ok, warning,
/// critical) would collide with the envelope's.
async fn handle_database_size(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let size = state.stats.database_size(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "database": size})))
}

/// A team create/update payload, from either JSON or multipart form
/// data. Multipart is the path the dashboard uses for logo uploads.
#[derive(Debug, Default)]
struct TeamForm {
    name: Option<String>,
    color: Option<Option<String>>,
    logo: Option<LogoUpload>,
    remove_logo: bool,
}

/// JSON body for team creation and updates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamBody {
    #[serde(default)]
    name: Option<String>,
    /// Present-and-null means "clear the color"; absent leaves it alone.
    #[serde(default, deserialize_with = "double_option")]
    color: Option<Option<String>>,
    #[serde(default)]
    remove_logo: bool,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Reads a team payload from a JSON or multipart request body.
async fn parse_team_payload(state: &AppState, req: Request) -> Result<TeamForm, HttpError> {
    let is_multipart: bool = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body): Json<TeamBody> = Json::from_request(req, state)
            .await
            .map_err(|e| HttpError::bad_request("body", &e.to_string()))?;
        return Ok(TeamForm {
            name: body.name,
            color: body.color,
            logo: None,
            remove_logo: body.remove_logo,
        });
    }

    let mut multipart: Multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| HttpError::bad_request("body", &e.to_string()))?;
    let mut form: TeamForm = TeamForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request("body", &e.to_string()))?
    {
        let field_name: String = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => {
                form.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| HttpError::bad_request("name", &e.to_string()))?,
                );
            }
            "color" => {
                let text: String = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request("color", &e.to_string()))?;
                form.color = Some(if text.trim().is_empty() { None } else { Some(text) });
            }
            "removeLogo" => {
                let text: String = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request("removeLogo", &e.to_string()))?;
                form.remove_logo = text == "true" || text == "1";
            }
            "logo" => {
                let mime: String = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request("logo", &e.to_string()))?;
                if !bytes.is_empty() {
                    form.logo = Some(LogoUpload {
                        bytes: bytes.to_vec(),
                        mime,
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Handler for GET /api/teams.
async fn handle_list_teams(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let teams = TeamService::list_teams(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "teams": teams})))
}

/// Handler for POST /api/teams.
async fn handle_create_team(
    AxumState(state): AxumState<AppState>,
    req: Request,
) -> Result<Json<Value>, HttpError> {
    let form: TeamForm = parse_team_payload(&state, req).await?;
    let name: String = form
        .name
        .ok_or_else(|| HttpError::bad_request("name", "Team name is required"))?;
    let color: Option<String> = form.color.flatten();
    let team = state
        .teams
        .create_team(&state.persistence, &name, color.as_deref(), form.logo)?;
    Ok(Json(json!({"status": "ok", "team": team})))
}

/// Handler for GET /api/teams/{id}.
async fn handle_get_team(
    AxumState(state): AxumState<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    let team = TeamService::get_team(&state.persistence, team_id)?;
    Ok(Json(json!({"status": "ok", "team": team})))
}

/// Handler for PUT /api/teams/{id}.
async fn handle_update_team(
    AxumState(state): AxumState<AppState>,
    Path(team_id): Path<i64>,
    req: Request,
) -> Result<Json<Value>, HttpError> {
    let form: TeamForm = parse_team_payload(&state, req).await?;
    let team = state.teams.update_team(
        &state.persistence,
        team_id,
        UpdateTeamInput {
            name: form.name,
            color: form.color,
            logo: form.logo,
            remove_logo: form.remove_logo,
        },
    )?;
    Ok(Json(json!({"status": "ok", "team": team})))
}

/// Handler for DELETE /api/teams/{id}.
async fn handle_delete_team(
    AxumState(state): AxumState<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Json<Value>, HttpError> {
    TeamService::delete_team(&state.persistence, team_id)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Handler for GET /api/teams/{id}/logo.
///
/// Serves the stored blob with its stored MIME type. Logos change
/// rarely; a short private cache keeps the dashboard snappy.
async fn handle_team_logo(
    AxumState(state): AxumState<AppState>,
    Path(team_id): Path<i64>,
) -> Result<Response, HttpError> {
    let (bytes, mime): (Vec<u8>, String) = TeamService::team_logo(&state.persistence, team_id)?;
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (
                header::CACHE_CONTROL,
                String::from("private, max-age=300"),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Handler for POST /api/teams/{id}/event-users.
async fn handle_add_event_user(
    AxumState(state): AxumState<AppState>,
    Path(team_id): Path<i64>,
    Json(req): Json<AddEventUserRequest>,
) -> Result<Json<Value>, HttpError> {
    TeamService::add_event_user(&state.persistence, team_id, &req.user_name)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Handler for DELETE /api/teams/{id}/event-users/{user_name}.
async fn handle_remove_event_user(
    AxumState(state): AxumState<AppState>,
    Path((team_id, user_name)): Path<(i64, String)>,
) -> Result<Json<Value>, HttpError> {
    TeamService::remove_event_user(&state.persistence, team_id, &user_name)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Handler for GET /api/orgs.
async fn handle_list_orgs(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let orgs = TeamService::list_orgs(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "orgs": orgs})))
}

/// Handler for POST /api/orgs.
async fn handle_upsert_org(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<UpsertOrgRequest>,
) -> Result<Json<Value>, HttpError> {
    let org = TeamService::upsert_org(&state.persistence, &req)?;
    Ok(Json(json!({"status": "ok", "org": org})))
}

/// Handler for POST /api/orgs/{org_id}/move.
async fn handle_move_org(
    AxumState(state): AxumState<AppState>,
    Path(org_id): Path<String>,
    Json(req): Json<MoveOrgRequest>,
) -> Result<Json<Value>, HttpError> {
    let org = TeamService::move_org(&state.persistence, &org_id, req.team_id)?;
    Ok(Json(json!({"status": "ok", "org": org})))
}

/// Handler for GET /api/settings/org-team-mappings.
async fn handle_list_mappings(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let mappings = TeamService::list_mappings(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "mappings": mappings})))
}

/// Handler for POST /api/settings/org-team-mappings.
async fn handle_replace_mappings(
    AxumState(state): AxumState<AppState>,
    Json(mappings): Json<Vec<MappingDto>>,
) -> Result<Json<Value>, HttpError> {
    let replaced: usize = TeamService::replace_mappings(&state.persistence, mappings)?;
    Ok(Json(json!({"status": "ok", "replaced": replaced})))
}

/// Handler for GET /api/users.
async fn handle_list_users(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<Value>, HttpError> {
    let users = OperatorAdminService::list(&state.persistence)?;
    Ok(Json(json!({"status": "ok", "users": users})))
}

/// Handler for POST /api/users.
async fn handle_create_user(
    AxumState(state): AxumState<AppState>,
    axum::Extension(actor): axum::Extension<CurrentOperator>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Value>, HttpError> {
    let user = state.users.create(
        &state.persistence,
        &actor,
        &req.username,
        &req.password,
        &req.role,
        req.is_producer,
    )?;
    Ok(Json(json!({"status": "ok", "user": user})))
}

/// Handler for PUT /api/users/{username}/password.
async fn handle_set_password(
    AxumState(state): AxumState<AppState>,
    axum::Extension(actor): axum::Extension<CurrentOperator>,
    Path(username): Path<String>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Json<Value>, HttpError> {
    state
        .users
        .set_password(&state.persistence, &actor, &username, &req.password)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Handler for PUT /api/users/{username}/role.
async fn handle_set_role(
    AxumState(state): AxumState<AppState>,
    axum::Extension(actor): axum::Extension<CurrentOperator>,
    Path(username): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<Value>, HttpError> {
    OperatorAdminService::set_role(&state.persistence, &actor, &username, &req.role)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Handler for DELETE /api/users/{username}.
async fn handle_delete_user(
    AxumState(state): AxumState<AppState>,
    axum::Extension(actor): axum::Extension<CurrentOperator>,
    Path(username): Path<String>,
) -> Result<Json<Value>, HttpError> {
    OperatorAdminService::delete(&state.persistence, &actor, &username)?;
    Ok(Json(json!({"status": "ok"})))
}

/// Fallback for unknown routes.
async fn handle_not_found() -> HttpError {
    HttpError::from(ApiError::NotFound {
        message: String::from("No such route"),
    })
}

/// Fallback for known routes hit with the wrong method.
async fn handle_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "status": "error",
            "code": "bad_request",
            "message": "Method not allowed",
        })),
    )
        .into_response()
}

/// Backpressure and per-request deadline middleware.
async fn limits(
    AxumState(state): AxumState<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = state.limiter.clone().try_acquire_owned() else {
        warn!("Concurrent request bound reached; shedding load");
        return HttpError::from(ApiError::Unavailable {
            message: String::from("Server is at its concurrent request bound"),
        })
        .into_response();
    };
    match tokio::time::timeout(state.request_timeout, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("Request exceeded its deadline");
            HttpError::from(ApiError::Timeout).into_response()
        }
    }
}

/// Builds the application router with all endpoints and middleware.
fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/api/auth/status", get(handle_auth_status))
        .route("/events", post(handle_ingest))
        .route(
            "/api/events",
            get(handle_list_events).delete(handle_delete_events),
        )
        .route(
            "/api/events/{id}",
            get(handle_get_event).delete(handle_delete_event),
        )
        .route("/api/sessions", get(handle_list_sessions))
        .route(
            "/api/sessions/{session_id}/activity",
            get(handle_session_activity),
        )
        .route("/api/event-types", get(handle_event_types))
        .route("/api/telemetry-users", get(handle_telemetry_users))
        .route("/api/event-users", get(handle_event_users))
        .route("/api/team-stats", get(handle_team_stats))
        .route("/api/daily-stats", get(handle_daily_stats))
        .route("/api/top-teams-today", get(handle_top_teams_today))
        .route("/api/top-users-today", get(handle_top_users_today))
        .route("/api/database-size", get(handle_database_size))
        .route("/api/teams", get(handle_list_teams).post(handle_create_team))
        .route(
            "/api/teams/{id}",
            get(handle_get_team)
                .put(handle_update_team)
                .delete(handle_delete_team),
        )
        .route("/api/teams/{id}/logo", get(handle_team_logo))
        .route(
            "/api/teams/{id}/event-users",
            post(handle_add_event_user),
        )
        .route(
            "/api/teams/{id}/event-users/{user_name}",
            delete(handle_remove_event_user),
        )
        .route("/api/orgs", get(handle_list_orgs).post(handle_upsert_org))
        .route("/api/orgs/{org_id}/move", post(handle_move_org))
        .route(
            "/api/settings/org-team-mappings",
            get(handle_list_mappings).post(handle_replace_mappings),
        )
        .route("/api/users", get(handle_list_users).post(handle_create_user))
        .route("/api/users/{username}/password", put(handle_set_password))
        .route("/api/users/{username}/role", put(handle_set_role))
        .route("/api/users/{username}", delete(handle_delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::guard,
        ))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), limits))
        .with_state(state)
}

/// Assembles the shared state from parsed configuration.
fn build_state(persistence: Persistence, args: &Args) -> AppState {
    AppState {
        persistence: Arc::new(persistence),
        auth: AuthService::new(
            args.session_ttl_seconds,
            args.producer_session_ttl_seconds,
            args.password_hash_cost,
        ),
        ingest: IngestService::new(args.max_event_bytes),
        teams: TeamService::new(args.logo_max_bytes),
        stats: StatsService::new(args.db_max_bytes, args.db_size_warn_pct, args.db_size_crit_pct),
        users: OperatorAdminService::new(args.password_hash_cost),
        limiter: Arc::new(Semaphore::new(args.max_concurrent_requests)),
        request_timeout: Duration::from_secs(args.request_timeout_seconds),
        secure_cookies: args.secure_cookies,
    }
}

/// Spawns the periodic session cleaner.
fn spawn_session_cleaner(persistence: Arc<Persistence>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match AuthService::cleanup_expired(&persistence) {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Swept expired sessions"),
                Err(e) => error!(error = %e, "Session sweep failed"),
            }
        }
    });
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Toolscope server");

    let persistence: Persistence = Persistence::new_with_file(
        &args.database_path,
        args.initial_template_path.as_deref(),
    )?;

    let mut conn = persistence.writer()?;
    if mutations::operators::seed_default_operator(&mut conn, args.password_hash_cost)? {
        warn!("Seeded default 'god' operator; change its password immediately");
    }
    drop(conn);

    let state: AppState = build_state(persistence, &args);
    spawn_session_cleaner(state.persistence.clone());

    let app: Router = build_router(state);

    let addr: SocketAddr = args.listen_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {addr}");

    let signal_seen: Arc<Notify> = Arc::new(Notify::new());
    let shutdown = {
        let signal_seen = signal_seen.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received; draining in-flight requests");
            signal_seen.notify_one();
        }
    };

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();
    tokio::pin!(server);
    let grace = async {
        signal_seen.notified().await;
        tokio::time::sleep(Duration::from_secs(args.shutdown_grace_seconds)).await;
    };
    tokio::pin!(grace);

    tokio::select! {
        result = &mut server => result?,
        () = &mut grace => {
            warn!("Shutdown grace elapsed with requests still in flight");
        }
    }

    info!("Server stopped");
    Ok(())
}
