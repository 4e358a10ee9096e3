//! Askama templates for the admin UI.

use crate::{
    forms::FormErrors,
    views::{ColumnFormatter, ModelView, VIEWS},
};
use askama::Template;
use axum::response::{Html, IntoResponse, Response};

/// Menu entry for one model view.
pub struct MenuItem {
    pub name: &'static str,
    pub label: &'static str,
}

/// Base data available to all logged-in templates.
pub struct BaseContext {
    pub username: String,
    pub menu: Vec<MenuItem>,
}

impl BaseContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            menu: VIEWS
                .iter()
                .map(|v| MenuItem {
                    name: v.name,
                    label: v.label,
                })
                .collect(),
        }
    }
}

/// Login page template
#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub login: String,
    pub errors: FormErrors,
}

/// Registration page template
#[derive(Template)]
#[template(path = "admin/register.html")]
pub struct RegisterTemplate {
    pub login: String,
    pub email: String,
    pub errors: FormErrors,
}

pub struct ViewSummary {
    pub name: &'static str,
    pub label: &'static str,
    pub rows: i64,
}

/// Dashboard page template
#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub base: BaseContext,
    pub views: Vec<ViewSummary>,
}

/// One list cell; the template escapes `value` either way.
pub struct ListCell {
    pub value: String,
    pub image: bool,
}

impl ListCell {
    pub fn new(view: &ModelView, column: &str, value: Option<String>) -> Self {
        Self {
            value: value.unwrap_or_default(),
            image: view.formatter(column) == ColumnFormatter::Image,
        }
    }
}

pub struct ListRow {
    pub pk: String,
    pub cells: Vec<ListCell>,
}

/// Model list page template
#[derive(Template)]
#[template(path = "admin/list.html")]
pub struct ListTemplate {
    pub base: BaseContext,
    pub view: &'static ModelView,
    pub rows: Vec<ListRow>,
}

pub struct FieldContext {
    pub name: &'static str,
    pub value: String,
    pub required: bool,
    pub is_file: bool,
    pub is_textarea: bool,
    pub errors: Vec<String>,
}

/// Create/edit form template
#[derive(Template)]
#[template(path = "admin/form.html")]
pub struct FormTemplate {
    pub base: BaseContext,
    pub view: &'static ModelView,
    pub action: String,
    pub creating: bool,
    pub fields: Vec<FieldContext>,
    pub form_errors: Vec<String>,
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: T) -> Response {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {e}")),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{BANNER_VIEW, POST_VIEW};

    #[test]
    fn login_template_shows_field_errors() {
        let mut errors = FormErrors::default();
        errors.add("login", "Invalid user");
        let html = LoginTemplate {
            login: "<ghost>".into(),
            errors,
        }
        .render()
        .unwrap();
        assert!(html.contains("Invalid user"));
        assert!(html.contains("ghost"));
        assert!(!html.contains("<ghost>"));
        assert!(html.contains(r#"href="/admin/register/""#));
    }

    fn banner_list(src: Option<&str>) -> String {
        let cells = [("id", Some("1")), ("src", src)]
            .into_iter()
            .map(|(column, value)| ListCell::new(&BANNER_VIEW, column, value.map(str::to_string)))
            .collect();
        ListTemplate {
            base: BaseContext::new("malebride"),
            view: &BANNER_VIEW,
            rows: vec![ListRow {
                pk: "1".into(),
                cells,
            }],
        }
        .render()
        .unwrap()
    }

    #[test]
    fn list_template_renders_image_cells() {
        let html = banner_list(Some("/uploads/a.png"));
        assert!(html.contains(r#"<img src="/uploads/a.png">"#));
        assert!(html.contains("/admin/banner/edit/1"));
        assert!(html.contains("/admin/banner/new/"));

        let html = banner_list(None);
        assert!(!html.contains("<img"));
    }

    #[test]
    fn list_template_escapes_cell_values() {
        let html = banner_list(Some(r#"x" onerror="alert(1)"#));
        assert!(html.contains("<img src="));
        assert!(!html.contains(r#"x" onerror"#));

        let html = ListTemplate {
            base: BaseContext::new("malebride"),
            view: &POST_VIEW,
            rows: vec![ListRow {
                pk: "1".into(),
                cells: vec![ListCell::new(&POST_VIEW, "message", Some("<b>hi</b>".into()))],
            }],
        }
        .render()
        .unwrap();
        assert!(html.contains("hi"));
        assert!(!html.contains("<b>hi</b>"));
    }
}
