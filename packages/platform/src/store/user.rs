use common::UserId;
use common::user::{Role, User};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::PlatformError;
use crate::models::user::{UserQuery, email_key};

/// Users, with a case-insensitive email index.
#[derive(Default)]
pub struct UserStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) -> Result<User, PlatformError> {
        let key = email_key(&user.email);
        match self.emails.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(PlatformError::Conflict(format!(
                    "Email {} is already in use",
                    user.email
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => {
                self.emails.remove(&key);
                Err(PlatformError::Conflict(format!(
                    "User {} already exists",
                    user.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|u| u.value().clone())
    }

    /// Look up a user, returning `NotFound` if it does not exist.
    pub fn require(&self, id: &UserId) -> Result<User, PlatformError> {
        self.get(id)
            .ok_or_else(|| PlatformError::NotFound(format!("User {id} not found")))
    }

    /// Update profile fields. Absent fields are left unchanged.
    pub fn update(
        &self,
        id: &UserId,
        name: Option<String>,
        email: Option<String>,
        role: Option<Role>,
    ) -> Result<User, PlatformError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| PlatformError::NotFound(format!("User {id} not found")))?;

        if let Some(email) = email {
            let email = email.trim().to_string();
            let old_key = email_key(&user.email);
            let new_key = email_key(&email);
            if new_key != old_key {
                match self.emails.entry(new_key) {
                    Entry::Occupied(_) => {
                        return Err(PlatformError::Conflict(format!(
                            "Email {email} is already in use"
                        )));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(id.clone());
                    }
                }
                self.emails.remove(&old_key);
            }
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name.trim().to_string();
        }
        if let Some(role) = role {
            user.role = role;
        }
        Ok(user.clone())
    }

    pub fn set_enabled(&self, id: &UserId, enabled: bool) -> Result<User, PlatformError> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| PlatformError::NotFound(format!("User {id} not found")))?;
        user.enabled = enabled;
        Ok(user.clone())
    }

    /// Remove a user and release their email.
    pub fn remove(&self, id: &UserId) -> Result<User, PlatformError> {
        let (_, user) = self
            .users
            .remove(id)
            .ok_or_else(|| PlatformError::NotFound(format!("User {id} not found")))?;
        self.emails
            .remove_if(&email_key(&user.email), |_, owner| owner == id);
        Ok(user)
    }

    /// Users matching `query`, ordered by id.
    pub fn search(&self, query: &UserQuery) -> Vec<User> {
        let mut users: Vec<_> = self
            .users
            .iter()
            .filter(|u| query.matches(u.value()))
            .map(|u| u.value().clone())
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// All users ordered by id.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<_> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }
}
