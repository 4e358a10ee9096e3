//! Defines routes for the admin backend.
//!
//! ## Structure
//! - **Admin index**
//!   - `GET       /admin/`           dashboard (redirects to login when anonymous)
//!   - `GET|POST  /admin/login/`     login form
//!   - `GET|POST  /admin/register/`  registration form (refused to banned addresses)
//!   - `GET       /admin/logout/`    end the session
//!
//! - **Model views** (`{view}` is a name from `views::VIEWS`)
//!   - `GET|POST  /admin/{view}/new/`           create
//!   - `GET|POST  /admin/{view}/edit/{id}`      edit
//!   - `POST      /admin/{view}/delete/{id}`    delete
//!   - `GET       /admin/{view}/`               list
//!
//! - **Other**
//!   - `GET /uploads/{file}` stored images
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        auth_handlers::{index, login_page, login_submit, logout, register_page, register_submit},
        health_handlers::{healthz, readyz},
        model_handlers::{
            create_page, create_submit, delete_row, edit_page, edit_submit, list_rows,
        },
        upload_handlers::get_upload,
    },
    middleware::reject_banned,
    services::AdminServices,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Build the full application router with its shared state.
pub fn routes(services: AdminServices) -> Router {
    let registration = Router::new()
        .route("/admin/register/", get(register_page).post(register_submit))
        .route_layer(middleware::from_fn_with_state(
            services.clone(),
            reject_banned,
        ));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/uploads/{file}", get(get_upload))
        // admin index
        .route("/admin/", get(index))
        .route("/admin/login/", get(login_page).post(login_submit))
        .route("/admin/logout/", get(logout))
        .merge(registration)
        // model views
        .route("/admin/{view}/", get(list_rows))
        .route("/admin/{view}/new/", get(create_page).post(create_submit))
        .route("/admin/{view}/edit/{id}", get(edit_page).post(edit_submit))
        .route("/admin/{view}/delete/{id}", post(delete_row))
        .with_state(services)
}
