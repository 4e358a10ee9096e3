//! Login and registration forms, plus the error map every admin form renders.

use crate::{
    models::user::User,
    services::auth_service::{AuthError, AuthService},
};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_USER: &str = "Invalid user";
pub const INVALID_PASSWORD: &str = "Invalid password";
pub const DUPLICATE_USERNAME: &str = "Duplicate username";

/// Key for errors that belong to the form rather than one field.
const FORM_LEVEL: &str = "";

/// Validation messages keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_form_error(&mut self, message: impl Into<String>) {
        self.add(FORM_LEVEL, message);
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn form_errors(&self) -> &[String] {
        self.get(FORM_LEVEL)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn require(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
            false
        } else {
            true
        }
    }
}

/// Submitted login credentials.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

impl LoginForm {
    /// Check required fields, then the stored hash. Returns the matching user.
    ///
    /// Unknown logins and wrong passwords are reported on the `login` field.
    pub async fn validate(&self, auth: &AuthService) -> Result<Result<User, FormErrors>, AuthError> {
        let mut errors = FormErrors::default();
        let has_login = errors.require("login", &self.login);
        let has_password = errors.require("password", &self.password);
        if !has_login {
            return Ok(Err(errors));
        }

        match auth.find_user_by_login(&self.login).await? {
            None => errors.add("login", INVALID_USER),
            Some(user) => {
                // the hash check runs even for a blank password
                if !AuthService::verify_password(&self.password, &user.password) {
                    errors.add("login", INVALID_PASSWORD);
                } else if has_password {
                    return Ok(Ok(user));
                }
            }
        }
        Ok(Err(errors))
    }
}

/// Submitted registration details.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub login: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub async fn validate(&self, auth: &AuthService) -> Result<FormErrors, AuthError> {
        let mut errors = FormErrors::default();
        let has_login = errors.require("login", &self.login);
        errors.require("password", &self.password);
        if has_login && auth.login_exists(&self.login).await? {
            errors.add("login", DUPLICATE_USERNAME);
        }
        Ok(errors)
    }

    pub fn email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use std::sync::Arc;

    async fn auth_with_user(login: &str, password: &str) -> AuthService {
        let auth = AuthService::new(Arc::new(test_pool().await), 60);
        auth.create_user(login, None, password).await.unwrap();
        auth
    }

    fn login(login: &str, password: &str) -> LoginForm {
        LoginForm {
            login: login.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_with_correct_password_returns_user() {
        let auth = auth_with_user("malebride", "test").await;
        let user = login("malebride", "test").validate(&auth).await.unwrap().unwrap();
        assert_eq!(user.login, "malebride");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_rejected() {
        let auth = auth_with_user("malebride", "test").await;
        let errors = login("malebride", "nope").validate(&auth).await.unwrap().unwrap_err();
        assert_eq!(errors.get("login"), [INVALID_PASSWORD]);
    }

    #[tokio::test]
    async fn login_with_unknown_user_is_rejected() {
        let auth = auth_with_user("malebride", "test").await;
        let errors = login("ghost", "test").validate(&auth).await.unwrap().unwrap_err();
        assert_eq!(errors.get("login"), [INVALID_USER]);
        assert!(errors.get("password").is_empty());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let auth = auth_with_user("malebride", "test").await;
        let errors = login("", "").validate(&auth).await.unwrap().unwrap_err();
        assert_eq!(errors.get("login"), [REQUIRED]);
        assert_eq!(errors.get("password"), [REQUIRED]);

        let errors = login("malebride", "").validate(&auth).await.unwrap().unwrap_err();
        assert_eq!(errors.get("login"), [INVALID_PASSWORD]);
        assert_eq!(errors.get("password"), [REQUIRED]);

        let errors = login("ghost", "").validate(&auth).await.unwrap().unwrap_err();
        assert_eq!(errors.get("login"), [INVALID_USER]);
        assert_eq!(errors.get("password"), [REQUIRED]);
    }

    #[tokio::test]
    async fn registration_rejects_existing_login() {
        let auth = auth_with_user("malebride", "test").await;
        let form = RegistrationForm {
            login: "malebride".into(),
            email: String::new(),
            password: "x".into(),
        };
        let errors = form.validate(&auth).await.unwrap();
        assert_eq!(errors.get("login"), [DUPLICATE_USERNAME]);

        let fresh = RegistrationForm {
            login: "newbie".into(),
            ..form
        };
        assert!(fresh.validate(&auth).await.unwrap().is_empty());
        assert_eq!(fresh.email(), None);
    }

    #[test]
    fn form_level_errors_are_kept_apart() {
        let mut errors = FormErrors::default();
        errors.add_form_error("already exists");
        errors.add("value", REQUIRED);
        assert_eq!(errors.form_errors(), ["already exists"]);
        assert_eq!(errors.get("value"), [REQUIRED]);
        assert!(errors.get("key").is_empty());
    }
}
