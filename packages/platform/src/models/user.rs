use chrono::{DateTime, Utc};
use common::UserId;
use common::user::{Role, User};
use common::validation::validate_name;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn with_id(mut self, id: impl Into<UserId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn into_user(self, id: UserId, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: self.role,
            enabled: true,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

pub fn validate_create_user(req: &CreateUserRequest) -> Result<(), PlatformError> {
    validate_name(&req.name, "Name")?;
    validate_email(&req.email)
}

pub fn validate_update_user(req: &UpdateUserRequest) -> Result<(), PlatformError> {
    if let Some(ref name) = req.name {
        validate_name(name, "Name")?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    Ok(())
}

/// `local@domain`, at most 254 characters, no whitespace.
pub fn validate_email(email: &str) -> Result<(), PlatformError> {
    let email = email.trim();
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            });
    if !valid {
        return Err(PlatformError::Validation(format!(
            "Invalid email address '{email}'"
        )));
    }
    Ok(())
}

/// Filter for listing users. Empty fields match everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub role: Option<Role>,
    /// Case-insensitive substring of the name or the email.
    #[serde(default)]
    pub search: Option<String>,
}

impl UserQuery {
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let text = text.to_lowercase();
                user.name.to_lowercase().contains(&text)
                    || user.email.to_lowercase().contains(&text)
            }
        }
    }
}

/// Key used for case-insensitive email uniqueness.
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
