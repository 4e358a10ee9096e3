//! Admin index, login, registration and logout.
//!
//! - GET  /admin/            dashboard, or redirect to login when anonymous
//! - GET  /admin/login/      login form (redirects home when already logged in)
//! - POST /admin/login/      authenticate and open a session
//! - GET  /admin/register/   registration form
//! - POST /admin/register/   create the user and open a session
//! - GET  /admin/logout/     close the session

use crate::{
    errors::AppError,
    forms::{DUPLICATE_USERNAME, FormErrors, LoginForm, RegistrationForm},
    middleware::{check_auth, cleared_session_cookie, session_cookie},
    models::user::User,
    services::{AdminServices, auth_service::AuthError},
    templates::{BaseContext, DashboardTemplate, LoginTemplate, RegisterTemplate, ViewSummary, render},
    views::VIEWS,
};
use axum::{
    Form,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};

pub const INDEX_URL: &str = "/admin/";
pub const LOGIN_URL: &str = "/admin/login/";

/// `GET /admin/`
pub async fn index(
    State(services): State<AdminServices>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };

    let mut views = Vec::with_capacity(VIEWS.len());
    for view in VIEWS {
        views.push(ViewSummary {
            name: view.name,
            label: view.label,
            rows: services.models.count(view).await?,
        });
    }

    Ok(render(DashboardTemplate {
        base: BaseContext::new(user.login),
        views,
    }))
}

/// `GET /admin/login/`
pub async fn login_page(State(services): State<AdminServices>, jar: CookieJar) -> Response {
    if check_auth(&services, &jar).await.is_some() {
        return Redirect::to(INDEX_URL).into_response();
    }

    render(LoginTemplate {
        login: String::new(),
        errors: FormErrors::default(),
    })
}

/// `POST /admin/login/`
pub async fn login_submit(
    State(services): State<AdminServices>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match form.validate(&services.auth).await? {
        Ok(user) => {
            info!("User {} logged in", user.login);
            start_session(&services, &user).await
        }
        Err(errors) => {
            warn!("Failed login attempt for `{}`", form.login);
            Ok(render(LoginTemplate {
                login: form.login,
                errors,
            }))
        }
    }
}

/// `GET /admin/register/`
pub async fn register_page() -> Response {
    render(RegisterTemplate {
        login: String::new(),
        email: String::new(),
        errors: FormErrors::default(),
    })
}

/// `POST /admin/register/`
pub async fn register_submit(
    State(services): State<AdminServices>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate(&services.auth).await?;

    if errors.is_empty() {
        match services
            .auth
            .create_user(&form.login, form.email(), &form.password)
            .await
        {
            Ok(user) => {
                info!("Registered user {}", user.login);
                return start_session(&services, &user).await;
            }
            // lost a race with a concurrent registration
            Err(AuthError::DuplicateLogin(_)) => errors.add("login", DUPLICATE_USERNAME),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(render(RegisterTemplate {
        login: form.login,
        email: form.email,
        errors,
    }))
}

/// `GET /admin/logout/`
pub async fn logout(State(services): State<AdminServices>, jar: CookieJar) -> Response {
    if let Some((session, user)) = check_auth(&services, &jar).await {
        match services.auth.delete_session(&session.session_id).await {
            Ok(()) => info!("User {} logged out", user.login),
            Err(e) => tracing::error!("Failed to delete session: {}", e),
        }
    }

    (
        [(header::SET_COOKIE, cleared_session_cookie())],
        Redirect::to(INDEX_URL),
    )
        .into_response()
}

/// Open a session for `user`, set the cookie and go to the dashboard.
async fn start_session(services: &AdminServices, user: &User) -> Result<Response, AppError> {
    let session = services.auth.create_session(user).await?;
    let cookie = session_cookie(&session.session_id, services.auth.session_timeout_secs);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(INDEX_URL)).into_response())
}
