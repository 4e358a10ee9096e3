//! HTTP handlers for the generic model views.
//!
//! Every handler resolves `{view}` against the static registry and requires a
//! logged-in session; anonymous requests are sent to the login page. Forms are
//! posted as `multipart/form-data` so file fields can stream straight to disk.

use crate::{
    errors::AppError,
    forms::FormErrors,
    handlers::auth_handlers::LOGIN_URL,
    middleware::check_auth,
    models::user::User,
    services::{
        AdminServices,
        model_service::{ModelError, Submission},
    },
    templates::{BaseContext, FieldContext, FormTemplate, ListCell, ListRow, ListTemplate, render},
    views::{ModelView, find_view},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use futures::StreamExt;
use std::{collections::BTreeMap, io};

/// Resolve the view or answer 404.
fn view_or_404(name: &str) -> Result<&'static ModelView, AppError> {
    find_view(name).ok_or_else(|| AppError::not_found(format!("no admin view named `{name}`")))
}

fn list_url(view: &ModelView) -> String {
    format!("/admin/{}/", view.name)
}

/// `GET /admin/{view}/`
pub async fn list_rows(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path(view): Path<String>,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;

    let rows = services
        .models
        .list(view)
        .await?
        .into_iter()
        .map(|row| ListRow {
            pk: row.pk,
            cells: view
                .column_list
                .iter()
                .zip(row.values)
                .map(|(column, value)| ListCell::new(view, column, value))
                .collect(),
        })
        .collect();

    Ok(render(ListTemplate {
        base: BaseContext::new(user.login),
        view,
        rows,
    }))
}

/// `GET /admin/{view}/new/`
pub async fn create_page(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path(view): Path<String>,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;
    if !view.can_create {
        return Err(ModelError::CreateNotAllowed(view.name).into());
    }

    Ok(form_page(&user, view, None, &BTreeMap::new(), &FormErrors::default()))
}

/// `POST /admin/{view}/new/`
pub async fn create_submit(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path(view): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;
    if !view.can_create {
        return Err(ModelError::CreateNotAllowed(view.name).into());
    }

    let submission = read_submission(&services, view, multipart).await?;
    let mut errors = submission.validate(view);
    if errors.is_empty() {
        match services.models.create(view, &submission).await {
            Ok(()) => {
                tracing::info!("{} created a {} row", user.login, view.name);
                return Ok(Redirect::to(&list_url(view)).into_response());
            }
            Err(err @ ModelError::Conflict(_)) => errors.add_form_error(err.to_string()),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(form_page(&user, view, None, &submission.values, &errors))
}

/// `GET /admin/{view}/edit/{id}`
pub async fn edit_page(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path((view, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;
    let values = services.models.fetch_form_values(view, &id).await?;

    Ok(form_page(&user, view, Some(&id), &values, &FormErrors::default()))
}

/// `POST /admin/{view}/edit/{id}`
pub async fn edit_submit(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path((view, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;

    let submission = read_submission(&services, view, multipart).await?;
    let mut errors = submission.validate(view);
    if errors.is_empty() {
        match services.models.update(view, &id, &submission).await {
            Ok(()) => {
                tracing::info!("{} updated {} `{}`", user.login, view.name, id);
                return Ok(Redirect::to(&list_url(view)).into_response());
            }
            Err(err @ ModelError::Conflict(_)) => errors.add_form_error(err.to_string()),
            Err(err) => return Err(err.into()),
        }
    }

    // keep showing stored files for fields that got no new upload
    let mut values = services.models.fetch_form_values(view, &id).await?;
    values.extend(submission.values);
    Ok(form_page(&user, view, Some(&id), &values, &errors))
}

/// `POST /admin/{view}/delete/{id}`
pub async fn delete_row(
    State(services): State<AdminServices>,
    jar: CookieJar,
    Path((view, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some((_, user)) = check_auth(&services, &jar).await else {
        return Ok(Redirect::to(LOGIN_URL).into_response());
    };
    let view = view_or_404(&view)?;

    services.models.delete(view, &id).await?;
    tracing::info!("{} deleted {} `{}`", user.login, view.name, id);
    Ok(Redirect::to(&list_url(view)).into_response())
}

/// Collect the view's form fields from a multipart body.
///
/// Unknown parts are ignored. File parts are streamed to the upload store and
/// recorded only when non-empty.
async fn read_submission(
    services: &AdminServices,
    view: &'static ModelView,
    mut multipart: Multipart,
) -> Result<Submission, AppError> {
    let mut submission = Submission::default();
    for field in view.form_fields.iter().filter(|f| !f.is_file()) {
        submission.set(field.name, "");
    }

    while let Some(part) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(field) = part.name().and_then(|name| view.field(name)) else {
            continue;
        };

        if field.is_file() {
            let filename = part.file_name().map(str::to_string);
            let stream = part.map(|chunk| chunk.map_err(io::Error::other));
            if let Some(url) = services
                .uploads
                .store_stream(filename.as_deref(), stream)
                .await?
            {
                submission.set(field.name, url);
            }
        } else {
            let text = part.text().await.map_err(bad_multipart)?;
            submission.set(field.name, text);
        }
    }

    Ok(submission)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, format!("invalid form body: {err}"))
}

fn form_page(
    user: &User,
    view: &'static ModelView,
    id: Option<&str>,
    values: &BTreeMap<&'static str, String>,
    errors: &FormErrors,
) -> Response {
    let fields = view
        .form_fields
        .iter()
        .map(|field| FieldContext {
            name: field.name,
            value: values.get(field.name).cloned().unwrap_or_default(),
            required: field.required,
            is_file: field.is_file(),
            is_textarea: field.is_textarea(),
            errors: errors.get(field.name).to_vec(),
        })
        .collect();

    let action = match id {
        Some(id) => format!("/admin/{}/edit/{}", view.name, id),
        None => format!("/admin/{}/new/", view.name),
    };

    render(FormTemplate {
        base: BaseContext::new(user.login.clone()),
        view,
        action,
        creating: id.is_none(),
        fields,
        form_errors: errors.form_errors().to_vec(),
    })
}
