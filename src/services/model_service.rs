//! src/services/model_service.rs
//!
//! ModelService — generic list/create/edit/delete queries over the tables
//! described by `views::ModelView`. Identifiers are pushed from the static
//! descriptors, values are always bound.

use crate::{
    forms::{FormErrors, REQUIRED},
    services::auth_service::is_unique_violation,
    views::{FieldKind, ModelView},
};
use sqlx::{QueryBuilder, Row, SqlitePool, sqlite::Sqlite};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{view} `{id}` not found")]
    NotFound { view: &'static str, id: String },
    #[error("{0} rows cannot be created from the admin")]
    CreateNotAllowed(&'static str),
    #[error("a {0} with these values already exists")]
    Conflict(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// One listed row: its primary key and the raw values of `column_list`.
#[derive(Debug, Clone)]
pub struct ListedRow {
    pub pk: String,
    pub values: Vec<Option<String>>,
}

/// Field values submitted through a model form.
///
/// Text fields are always present (empty when blank). File fields are present
/// only when a file was actually uploaded.
#[derive(Debug, Default, Clone)]
pub struct Submission {
    pub values: BTreeMap<&'static str, String>,
}

impl Submission {
    pub fn set(&mut self, field: &'static str, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Required-field checks against the view's form.
    pub fn validate(&self, view: &ModelView) -> FormErrors {
        let mut errors = FormErrors::default();
        for field in view.form_fields.iter().filter(|f| f.required) {
            if self.get(field.name).is_none_or(|v| v.trim().is_empty()) {
                errors.add(field.name, REQUIRED);
            }
        }
        errors
    }

    /// Columns to write, in form order. Blank text becomes NULL.
    fn assignments(&self, view: &ModelView) -> Vec<(&'static str, Option<String>)> {
        view.form_fields
            .iter()
            .filter_map(|field| match (field.kind, self.values.get(field.name)) {
                (FieldKind::File, None) => None,
                (_, Some(v)) if !v.trim().is_empty() => Some((field.name, Some(v.clone()))),
                _ => Some((field.name, None)),
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct ModelService {
    pub db: Arc<SqlitePool>,
}

impl ModelService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn count(&self, view: &ModelView) -> ModelResult<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        builder.push(view.table);
        let count: i64 = builder.build_query_scalar().fetch_one(&*self.db).await?;
        Ok(count)
    }

    /// All rows of the view's table ordered by primary key.
    pub async fn list(&self, view: &ModelView) -> ModelResult<Vec<ListedRow>> {
        let mut builder = select_columns(view.primary_key, view.column_list);
        builder.push(" FROM ");
        builder.push(view.table);
        builder.push(" ORDER BY ");
        builder.push(view.primary_key);

        let rows = builder.build().fetch_all(&*self.db).await?;
        rows.iter()
            .map(|row| -> ModelResult<ListedRow> {
                let pk: Option<String> = row.try_get(0)?;
                let values = (1..=view.column_list.len())
                    .map(|idx| row.try_get::<Option<String>, _>(idx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ListedRow {
                    pk: pk.unwrap_or_default(),
                    values,
                })
            })
            .collect()
    }

    /// Current values of the view's form fields for one row.
    pub async fn fetch_form_values(
        &self,
        view: &'static ModelView,
        id: &str,
    ) -> ModelResult<BTreeMap<&'static str, String>> {
        let names: Vec<&'static str> = view.form_fields.iter().map(|f| f.name).collect();
        let mut builder = select_columns(view.primary_key, &names);
        builder.push(" FROM ");
        builder.push(view.table);
        push_pk_filter(&mut builder, view, id);

        let row = builder
            .build()
            .fetch_optional(&*self.db)
            .await?
            .ok_or_else(|| not_found(view, id))?;

        let mut values = BTreeMap::new();
        for (idx, name) in names.iter().enumerate() {
            let value: Option<String> = row.try_get(idx + 1)?;
            values.insert(*name, value.unwrap_or_default());
        }
        Ok(values)
    }

    pub async fn create(&self, view: &'static ModelView, submission: &Submission) -> ModelResult<()> {
        if !view.can_create {
            return Err(ModelError::CreateNotAllowed(view.name));
        }

        let assignments = submission.assignments(view);
        let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        builder.push(view.table);
        if assignments.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            builder.push(" (");
            let mut columns = builder.separated(", ");
            for (column, _) in &assignments {
                columns.push(*column);
            }
            builder.push(") VALUES (");
            let mut values = builder.separated(", ");
            for (_, value) in assignments {
                values.push_bind(value);
            }
            builder.push(")");
        }

        builder
            .build()
            .execute(&*self.db)
            .await
            .map_err(|err| conflict_or_sqlx(view, err))?;
        debug!("created {} row", view.name);
        Ok(())
    }

    pub async fn update(
        &self,
        view: &'static ModelView,
        id: &str,
        submission: &Submission,
    ) -> ModelResult<()> {
        let assignments = submission.assignments(view);
        if assignments.is_empty() {
            // nothing to write, but the row must still exist
            self.fetch_form_values(view, id).await?;
            return Ok(());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
        builder.push(view.table);
        builder.push(" SET ");
        let mut sets = builder.separated(", ");
        for (column, value) in assignments {
            sets.push(column);
            sets.push_unseparated(" = ");
            sets.push_bind_unseparated(value);
        }
        push_pk_filter(&mut builder, view, id);

        let result = builder
            .build()
            .execute(&*self.db)
            .await
            .map_err(|err| conflict_or_sqlx(view, err))?;
        if result.rows_affected() == 0 {
            return Err(not_found(view, id));
        }
        debug!("updated {} `{}`", view.name, id);
        Ok(())
    }

    pub async fn delete(&self, view: &'static ModelView, id: &str) -> ModelResult<()> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM ");
        builder.push(view.table);
        push_pk_filter(&mut builder, view, id);

        let result = builder.build().execute(&*self.db).await?;
        if result.rows_affected() == 0 {
            return Err(not_found(view, id));
        }
        debug!("deleted {} `{}`", view.name, id);
        Ok(())
    }
}

/// `SELECT CAST(pk AS TEXT), CAST(col AS TEXT), ...`
fn select_columns<'a>(primary_key: &str, columns: &[&str]) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
    let mut select = builder.separated(", ");
    for column in std::iter::once(&primary_key).chain(columns.iter()) {
        select.push(format!("CAST({} AS TEXT)", column));
    }
    builder
}

fn push_pk_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, view: &ModelView, id: &str) {
    builder.push(" WHERE ");
    builder.push(view.primary_key);
    builder.push(" = ");
    builder.push_bind(id.to_string());
}

fn not_found(view: &ModelView, id: &str) -> ModelError {
    ModelError::NotFound {
        view: view.name,
        id: id.to_string(),
    }
}

fn conflict_or_sqlx(view: &'static ModelView, err: sqlx::Error) -> ModelError {
    if is_unique_violation(&err) {
        ModelError::Conflict(view.name)
    } else {
        ModelError::Sqlx(err)
    }
}
