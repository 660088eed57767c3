use crate::{
    EngineError, NewUser, ResultEngine, UpdateUserCmd, User, UserId,
    util::{normalize_email, normalize_required_name},
};

use super::Engine;

impl Engine {
    /// Register a user with a zero balance.
    ///
    /// Emails are unique (case-insensitive): a taken email is
    /// [`EngineError::ExistingKey`].
    pub async fn create_user(&self, name: &str, email: &str) -> ResultEngine<User> {
        let name = normalize_required_name(name, "user")?;
        let email = normalize_email(email)?;
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(EngineError::ExistingKey(email));
        }
        let user = self
            .store
            .insert_user(NewUser {
                name,
                email: email.clone(),
            })
            .await
            .map_err(|err| err.or_existing_key(&email))?;
        tracing::debug!(user_id = user.id, "created user");
        Ok(user)
    }

    pub async fn user(&self, user_id: UserId) -> ResultEngine<User> {
        self.require_user(user_id).await
    }

    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        self.store
            .find_user_by_email(&email)
            .await?
            .ok_or(EngineError::NotFound(email))
    }

    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        self.store.list_users().await
    }

    /// Rename a user or change their email. The balance is never touched
    /// here, but the user scope is held so a concurrent ledger mutation
    /// cannot be overwritten.
    pub async fn update_user(&self, cmd: UpdateUserCmd) -> ResultEngine<User> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "user"))
            .transpose()?;
        let email = cmd.email.as_deref().map(normalize_email).transpose()?;

        let _scope = self.scopes.acquire(cmd.user_id, None).await;
        let mut user = self.require_user(cmd.user_id).await?;
        if let Some(email) = email
            && email != user.email
        {
            if self.store.find_user_by_email(&email).await?.is_some() {
                return Err(EngineError::ExistingKey(email));
            }
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name;
        }
        self.store
            .save_user(&user)
            .await
            .map_err(|err| err.or_existing_key(&user.email))?;
        tracing::debug!(user_id = user.id, "updated user");
        Ok(user)
    }

    /// Delete a user with every bill, transaction and tag they own.
    pub async fn delete_user(&self, user_id: UserId) -> ResultEngine<()> {
        let _scope = self.scopes.acquire(user_id, None).await;
        self.require_user(user_id).await?;
        self.store.delete_user(user_id).await?;
        self.cache.evict_user(user_id);
        tracing::info!(user_id, "deleted user");
        Ok(())
    }
}
