use serde::{Deserialize, Serialize};

use super::validation::{self, FieldErrors, MAX_NAME_LENGTH};
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::ProfileChanges;

/// Body of `POST /api/user/create`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl CreateUserRequest {
    pub fn validate(self, min_password_length: usize) -> Result<NewAccount, ApiError> {
        let mut errors = FieldErrors::new();
        let email = errors.check(
            "email",
            validation::required(self.email.as_deref()).and_then(validation::email),
        );
        let password = errors.check(
            "password",
            validation::required(self.password.as_deref()).and_then(|p| validation::password(p, min_password_length)),
        );
        let name = errors.check("name", validation::required_text(self.name.as_deref(), MAX_NAME_LENGTH));
        errors.into_result()?;

        match (email, password, name) {
            (Some(email), Some(password), Some(name)) => Ok(NewAccount { email, password, name }),
            _ => Err(ApiError::validation_error("Invalid input", None)),
        }
    }
}

/// Body of `PUT` and `PATCH /api/user/me`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UpdateUserRequest {
    /// `partial` is PATCH semantics; otherwise email and name must be present
    pub fn validate(self, partial: bool, min_password_length: usize) -> Result<ProfileChanges, ApiError> {
        let mut errors = FieldErrors::new();

        if !partial {
            if self.email.is_none() {
                errors.add("email", validation::REQUIRED);
            }
            if self.name.is_none() {
                errors.add("name", validation::REQUIRED);
            }
        }

        let email = self
            .email
            .as_deref()
            .and_then(|email| errors.check("email", validation::email(email)));
        let name = self
            .name
            .as_deref()
            .and_then(|name| errors.check("name", validation::text(name, MAX_NAME_LENGTH)));
        let password = self
            .password
            .as_deref()
            .and_then(|password| errors.check("password", validation::password(password, min_password_length)));

        errors.into_result()?;
        Ok(ProfileChanges { email, name, password })
    }
}

/// Body of `POST /api/user/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TokenRequest {
    pub fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", validation::required_text(self.email.as_deref(), MAX_NAME_LENGTH));
        // Whitespace is significant in passwords
        let password = errors.check(
            "password",
            validation::required(self.password).and_then(|p| {
                if p.is_empty() {
                    Err(validation::BLANK.to_string())
                } else {
                    Ok(p)
                }
            }),
        );
        errors.into_result()?;

        email
            .zip(password)
            .ok_or_else(|| ApiError::validation_error("Invalid input", None))
    }
}

/// Public view of an account. The password never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    pub token: String,
}
