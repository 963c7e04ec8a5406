// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The static route-classification table.
//!
//! Every registered route appears here with its authentication class; no
//! route is implicitly authenticated. The session guard looks up the
//! matched path pattern in this table before a handler runs, and treats a
//! missing entry as locked down to the strictest class.

use toolscope_domain::Role;

/// How a route is guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthClass {
    /// No session required.
    Public,
    /// A session is used when present but not required.
    OptionalSession,
    /// A valid session is required.
    Authed,
    /// A valid session plus a matching CSRF header.
    AuthedCsrf,
    /// A valid session with at least the given role.
    RoleGated(Role),
    /// A valid session with at least the given role, plus CSRF.
    RoleGatedCsrf(Role),
}

/// (method, registered path pattern, class) for every route.
const ROUTES: &[(&str, &str, AuthClass)] = &[
    ("POST", "/login", AuthClass::Public),
    ("POST", "/logout", AuthClass::AuthedCsrf),
    ("GET", "/api/auth/status", AuthClass::OptionalSession),
    ("POST", "/events", AuthClass::AuthedCsrf),
    ("GET", "/api/events", AuthClass::Authed),
    // Deleting everything (no sessionId filter) additionally requires the
    // advanced role; the handler enforces that split.
    ("DELETE", "/api/events", AuthClass::AuthedCsrf),
    ("GET", "/api/events/{id}", AuthClass::Authed),
    ("DELETE", "/api/events/{id}", AuthClass::AuthedCsrf),
    ("GET", "/api/sessions", AuthClass::Authed),
    ("GET", "/api/sessions/{session_id}/activity", AuthClass::Authed),
    ("GET", "/api/event-types", AuthClass::Authed),
    ("GET", "/api/telemetry-users", AuthClass::Authed),
    ("GET", "/api/event-users", AuthClass::Authed),
    ("GET", "/api/team-stats", AuthClass::Authed),
    ("GET", "/api/daily-stats", AuthClass::Authed),
    ("GET", "/api/top-teams-today", AuthClass::Authed),
    ("GET", "/api/top-users-today", AuthClass::Authed),
    ("GET", "/api/database-size", AuthClass::Authed),
    ("GET", "/api/teams", AuthClass::Authed),
    ("POST", "/api/teams", AuthClass::RoleGatedCsrf(Role::Administrator)),
    ("GET", "/api/teams/{id}", AuthClass::Authed),
    ("PUT", "/api/teams/{id}", AuthClass::RoleGatedCsrf(Role::Administrator)),
    (
        "DELETE",
        "/api/teams/{id}",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    ("GET", "/api/teams/{id}/logo", AuthClass::Authed),
    (
        "POST",
        "/api/teams/{id}/event-users",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    (
        "DELETE",
        "/api/teams/{id}/event-users/{user_name}",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    ("GET", "/api/orgs", AuthClass::Authed),
    ("POST", "/api/orgs", AuthClass::RoleGatedCsrf(Role::Administrator)),
    (
        "POST",
        "/api/orgs/{org_id}/move",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    ("GET", "/api/settings/org-team-mappings", AuthClass::Authed),
    (
        "POST",
        "/api/settings/org-team-mappings",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    ("GET", "/api/users", AuthClass::RoleGated(Role::Administrator)),
    ("POST", "/api/users", AuthClass::RoleGatedCsrf(Role::Administrator)),
    (
        "PUT",
        "/api/users/{username}/password",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    (
        "PUT",
        "/api/users/{username}/role",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
    (
        "DELETE",
        "/api/users/{username}",
        AuthClass::RoleGatedCsrf(Role::Administrator),
    ),
];

/// Looks up the auth class of a matched route.
#[must_use]
pub fn classify(method: &str, path_pattern: &str) -> Option<AuthClass> {
    ROUTES
        .iter()
        .find(|(m, p, _)| *m == method && *p == path_pattern)
        .map(|(_, _, class)| *class)
}
