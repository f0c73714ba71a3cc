use crate::{
    auth::{self, ResetToken},
    entities::{user, User},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Admin user listing page size.
pub const USERS_PAGE_SIZE: u64 = 10;

/// Account management: registration, login, profile and password flows,
/// plus the admin-facing user listing.
#[derive(Clone)]
pub struct UserAccountService {
    db: Arc<DatabaseConnection>,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<Value>,
}

pub struct UserPage {
    pub users: Vec<user::Model>,
    pub total: u64,
    pub page: u64,
}

impl UserAccountService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Register a new account with the `User` role.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(input.email.as_str()))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "User already registered!".to_string(),
            ));
        }

        let password_hash =
            auth::hash_password(&input.password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(user::ROLE_USER.to_string()),
            avatar: Set(None),
            reset_password_token: Set(None),
            reset_password_expires: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let account = account.insert(&*self.db).await?;
        info!("Registered user {}", account.id);
        Ok(account)
    }

    /// Verify credentials, returning the account on success.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let account = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Invalid email or password.".to_string()))?;

        let matches = auth::verify_password(password, &account.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !matches {
            return Err(ServiceError::AuthError(
                "Invalid email or password.".to_string(),
            ));
        }

        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))
    }

    /// Update name, email and/or avatar.
    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<user::Model, ServiceError> {
        let account = self.get_user(user_id).await?;

        if let Some(ref email) = input.email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .filter(user::Column::Id.ne(user_id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::ValidationError(
                    "Email is already in use.".to_string(),
                ));
            }
        }

        let mut active: user::ActiveModel = account.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(avatar) = input.avatar {
            active.avatar = Set(Some(avatar));
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    /// Change password after verifying the current one.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn update_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let account = self.get_user(user_id).await?;

        let matches = auth::verify_password(current_password, &account.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !matches {
            return Err(ServiceError::ValidationError(
                "Current password is incorrect.".to_string(),
            ));
        }

        let password_hash =
            auth::hash_password(new_password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!("Password updated for user {}", user_id);
        Ok(())
    }

    /// Issue a password reset token for the account with this email. The
    /// plaintext token goes back to the caller; only its digest is stored.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<ResetToken, ServiceError> {
        let account = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        let reset = auth::generate_reset_token();

        let mut active: user::ActiveModel = account.into();
        active.reset_password_token = Set(Some(reset.hashed.clone()));
        active.reset_password_expires = Set(Some(reset.expires_at));
        active.update(&*self.db).await?;

        Ok(reset)
    }

    /// Redeem a reset token and set a new password.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<user::Model, ServiceError> {
        let hashed = auth::hash_reset_token(token);

        let account = User::find()
            .filter(user::Column::ResetPasswordToken.eq(hashed))
            .filter(user::Column::ResetPasswordExpires.gt(Utc::now()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "Reset password token is invalid or has expired.".to_string(),
                )
            })?;

        let password_hash =
            auth::hash_password(new_password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(password_hash);
        active.reset_password_token = Set(None);
        active.reset_password_expires = Set(None);
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    /// Admin listing of shopper accounts, newest first, ten per page.
    #[instrument(skip(self))]
    pub async fn list_customers(&self, page: u64) -> Result<UserPage, ServiceError> {
        let page = page.max(1);

        let base = User::find().filter(user::Column::Role.eq(user::ROLE_USER));
        let total = base.clone().count(&*self.db).await?;

        let users = base
            .order_by_desc(user::Column::CreatedAt)
            .limit(USERS_PAGE_SIZE)
            .offset((page - 1) * USERS_PAGE_SIZE)
            .all(&*self.db)
            .await?;

        Ok(UserPage { users, total, page })
    }

    /// Admin deletion of an account. Avatar cleanup in object storage is
    /// handled by an external collaborator.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let account = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found.".to_string()))?;

        account.delete(&*self.db).await?;
        info!("Deleted user {}", user_id);
        Ok(())
    }
}
