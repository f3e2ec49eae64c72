//! User service - Profile reads and edits.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{MAX_AGE, MIN_AGE};
use crate::domain::{Password, ProfileUpdate, PublicProfile, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait UserService: Send + Sync {
    /// The caller's own account
    async fn me(&self, id: Uuid) -> AppResult<User>;

    /// Partial profile edit; omitted fields stay as they are
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User>;

    async fn change_password(&self, id: Uuid, current: String, new: String) -> AppResult<()>;

    /// Contact card of any user
    async fn public_profile(&self, id: Uuid) -> AppResult<PublicProfile>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn clean_update(update: ProfileUpdate) -> AppResult<ProfileUpdate> {
    fn required(field: Option<String>, label: &str) -> AppResult<Option<String>> {
        match field.map(|v| v.trim().to_string()) {
            Some(v) if v.is_empty() => Err(AppError::validation(format!("{} cannot be empty", label))),
            other => Ok(other),
        }
    }

    if let Some(age) = update.age {
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(AppError::validation(format!(
                "Age must be between {} and {}",
                MIN_AGE, MAX_AGE
            )));
        }
    }

    Ok(ProfileUpdate {
        first_name: required(update.first_name, "First name")?,
        last_name: required(update.last_name, "Last name")?,
        age: update.age,
        contact_number: update.contact_number.map(|c| c.trim().to_string()),
    })
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn me(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let update = clean_update(update)?;
        self.uow.users().update_profile(id, update).await
    }

    async fn change_password(&self, id: Uuid, current: String, new: String) -> AppResult<()> {
        let user = self.me(id).await?;

        if !Password::from_hash(user.password_hash).verify(&current) {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = Password::new(&new)?.into_string();
        self.uow.users().update_password(id, password_hash).await?;
        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    async fn public_profile(&self, id: Uuid) -> AppResult<PublicProfile> {
        self.me(id).await.map(PublicProfile::from)
    }
}
