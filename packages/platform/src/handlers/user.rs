use common::UserId;
use common::user::{User, UserStats};
use tracing::{info, instrument};

use super::generated_id;
use crate::Platform;
use crate::error::PlatformError;
use crate::models::user::*;

impl Platform {
    #[instrument(skip(self, req), fields(name = %req.name, role = ?req.role))]
    pub fn create_user(&self, req: CreateUserRequest) -> Result<User, PlatformError> {
        validate_create_user(&req)?;
        let id = req
            .id
            .clone()
            .unwrap_or_else(|| UserId::new(generated_id("u")));
        let user = self.state.users.insert(req.into_user(id, self.now()))?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self, req), fields(user_id = %id))]
    pub fn update_user(&self, id: &UserId, req: UpdateUserRequest) -> Result<User, PlatformError> {
        validate_update_user(&req)?;
        let user = self.state.users.update(id, req.name, req.email, req.role)?;
        info!("User updated");
        Ok(user)
    }

    /// Enable or disable an account. Disabled users cannot submit.
    #[instrument(skip(self), fields(user_id = %id))]
    pub fn set_user_enabled(&self, id: &UserId, enabled: bool) -> Result<User, PlatformError> {
        let user = self.state.users.set_enabled(id, enabled)?;
        info!(enabled, "User status changed");
        Ok(user)
    }

    /// Delete an account that never submitted. Accounts with submissions
    /// can only be disabled.
    #[instrument(skip(self), fields(user_id = %id))]
    pub fn delete_user(&self, id: &UserId) -> Result<(), PlatformError> {
        let _authoring = self.authoring();
        self.state.users.require(id)?;
        if self.state.submissions.has_user_submissions(id) {
            return Err(PlatformError::Conflict(format!(
                "User {id} has submissions, disable the account instead"
            )));
        }

        self.state.users.remove(id)?;
        self.state.contests.unregister_everywhere(id);
        info!("User deleted");
        Ok(())
    }

    pub fn user(&self, id: &UserId) -> Result<User, PlatformError> {
        self.state.users.require(id)
    }

    /// All users ordered by id.
    pub fn users(&self) -> Vec<User> {
        self.state.users.list()
    }

    /// Users filtered by role and by a name or email substring.
    pub fn search_users(&self, query: &UserQuery) -> Vec<User> {
        self.state.users.search(query)
    }

    /// Solved problems and submission count, computed from the registry.
    pub async fn user_stats(&self, id: &UserId) -> Result<UserStats, PlatformError> {
        self.state.users.require(id)?;
        Ok(self.state.submissions.user_stats(id).await)
    }
}
