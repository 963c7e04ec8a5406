// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction and the authentication guard.
//!
//! The guard runs on every registered route. It resolves the session
//! cookie into an operator, looks the matched path pattern up in the
//! static route table, and enforces the route's class (session, CSRF
//! header, minimum role) before the handler sees the request. Handlers
//! read the resolved operator out of request extensions.

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use toolscope_api::{ApiError, AuthService, CurrentOperator};
use toolscope_domain::Role;
use tracing::warn;

use crate::routes::{self, AuthClass};
use crate::{AppState, HttpError};

/// The opaque session cookie.
pub const SESSION_COOKIE: &str = "toolscope_session";

/// The script-readable CSRF cookie.
pub const CSRF_COOKIE: &str = "toolscope_csrf";

/// The header mutating requests echo the CSRF token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// The session resolved for an optional-auth route, present or not.
#[derive(Debug, Clone)]
pub struct MaybeOperator(pub Option<CurrentOperator>);

/// Extracts a named cookie from the `Cookie` header.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header: &str = headers.get("cookie")?.to_str().ok()?;
    for pair in header.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// The per-route authentication middleware.
pub async fn guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    // Fallback handlers (404) have no matched path and no table entry.
    let Some(matched) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
    else {
        return next.run(req).await;
    };

    // A route missing from the table is locked down, not open.
    let class: AuthClass = routes::classify(req.method().as_str(), &matched)
        .unwrap_or(AuthClass::RoleGatedCsrf(Role::God));

    let operator: Option<CurrentOperator> = cookie_value(req.headers(), SESSION_COOKIE)
        .and_then(|token| AuthService::validate_session(&state.persistence, &token).ok());

    match class {
        AuthClass::Public => return next.run(req).await,
        AuthClass::OptionalSession => {
            req.extensions_mut().insert(MaybeOperator(operator));
            return next.run(req).await;
        }
        AuthClass::Authed
        | AuthClass::AuthedCsrf
        | AuthClass::RoleGated(_)
        | AuthClass::RoleGatedCsrf(_) => {}
    }

    let Some(operator) = operator else {
        warn!(method = %req.method(), path = %matched, "Rejected unauthenticated request");
        return HttpError::from(ApiError::AuthenticationFailed {
            reason: String::from("A valid session is required"),
        })
        .into_response();
    };

    if matches!(class, AuthClass::AuthedCsrf | AuthClass::RoleGatedCsrf(_)) {
        let header: Option<&str> = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok());
        if let Err(err) = AuthService::check_csrf(&operator, header) {
            warn!(
                method = %req.method(),
                path = %matched,
                username = %operator.username,
                "Rejected request with missing or mismatched CSRF token"
            );
            return HttpError::from(err).into_response();
        }
    }

    if let AuthClass::RoleGated(required) | AuthClass::RoleGatedCsrf(required) = class {
        if !operator.satisfies(required) {
            warn!(
                method = %req.method(),
                path = %matched,
                username = %operator.username,
                required = required.as_str(),
                "Rejected request below the required role"
            );
            return HttpError::from(ApiError::RoleInsufficient {
                required: required.as_str().to_string(),
            })
            .into_response();
        }
    }

    req.extensions_mut().insert(operator);
    next.run(req).await
}
