//! Session lookup and ban enforcement shared by the admin handlers.

use crate::{
    models::{session::Session, user::User},
    services::AdminServices,
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::net::SocketAddr;
use tracing::{error, warn};

/// Cookie name for the session ID
pub const SESSION_COOKIE: &str = "soyboard_admin_session";

/// Session and user behind the request's cookie, if it is still valid.
pub async fn check_auth(services: &AdminServices, jar: &CookieJar) -> Option<(Session, User)> {
    let session_id = jar.get(SESSION_COOKIE)?.value().to_string();
    match services.auth.validate_session(&session_id).await {
        Ok(found) => found,
        Err(e) => {
            error!("Session lookup failed: {}", e);
            None
        }
    }
}

/// `Set-Cookie` value carrying a new session id.
pub fn session_cookie(session_id: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// `Set-Cookie` value that clears the session cookie.
pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/admin; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Reject requests whose remote address is banned.
///
/// Requests without connection info (e.g. in-process tests) pass through.
pub async fn reject_banned(
    State(services): State<AdminServices>,
    request: Request,
    next: Next,
) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = remote {
        match services.bans.lookup(ip).await {
            Ok(Some(ban)) => {
                warn!("Rejected banned address {} (ban #{})", ip, ban.id);
                let message = match ban.reason {
                    Some(reason) if !reason.is_empty() => format!("You are banned: {reason}"),
                    _ => "You are banned.".to_string(),
                };
                return (StatusCode::FORBIDDEN, message).into_response();
            }
            Ok(None) => {}
            Err(e) => {
                error!("Ban lookup failed for {}: {}", ip, e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Ban lookup failed").into_response();
            }
        }
    }

    next.run(request).await
}
