//! User service implementation
//!
//! This service handles user registration on first contact, profile management,
//! role flags, and notification preferences.

use std::collections::HashMap;
use tracing::{info, warn, debug};
use crate::config::settings::Settings;
use crate::database::repositories::UserRepository;
use crate::models::user::{User, CreateUserRequest, UpdateUserRequest};
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::{is_valid_email, is_valid_phone};

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    settings: Settings,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(user_repository: UserRepository, settings: Settings) -> Self {
        Self {
            user_repository,
            settings,
        }
    }

    /// Register a new user or get existing user
    pub async fn register_or_get_user(&self, telegram_id: i64, username: Option<String>, first_name: Option<String>, last_name: Option<String>) -> Result<User> {
        debug!(telegram_id = telegram_id, "Attempting to register or get user");

        if let Some(existing_user) = self.user_repository.find_by_telegram_id(telegram_id).await? {
            debug!(user_id = existing_user.id, telegram_id = telegram_id, "User already exists, returning existing user");
            return Ok(existing_user);
        }

        let create_request = CreateUserRequest {
            telegram_id,
            username,
            first_name,
            last_name,
        };

        let user = self.user_repository.create(create_request).await?;
        info!(user_id = user.id, telegram_id = telegram_id, "New user registered successfully");

        // Configured bootstrap admins get their role flag on first contact
        if self.settings.bot.admin_ids.contains(&telegram_id) {
            let update = UpdateUserRequest {
                is_admin: Some(true),
                ..Default::default()
            };
            return self.user_repository.update(user.id, update).await;
        }

        Ok(user)
    }

    /// Get user by Telegram ID
    pub async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        self.user_repository.find_by_telegram_id(telegram_id).await
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        self.user_repository.find_by_id(user_id).await
    }

    /// Update user profile fields after validating contact details
    pub async fn update_user_profile(&self, telegram_id: i64, update_request: UpdateUserRequest) -> Result<User> {
        debug!(telegram_id = telegram_id, "Updating user profile");

        if let Some(ref email) = update_request.email {
            if !is_valid_email(email) {
                return Err(GatherlyError::InvalidInput(format!("Invalid email address: {}", email)));
            }
        }
        if let Some(ref phone) = update_request.phone {
            if !is_valid_phone(phone) {
                return Err(GatherlyError::InvalidInput(format!("Invalid phone number: {}", phone)));
            }
        }

        let existing_user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        let user = self.user_repository.update(existing_user.id, update_request).await?;
        info!(telegram_id = telegram_id, user_id = existing_user.id, "User profile updated successfully");

        Ok(user)
    }

    /// Grant or revoke the organizer role
    pub async fn set_organizer_status(&self, telegram_id: i64, is_organizer: bool, admin_id: i64) -> Result<User> {
        info!(telegram_id = telegram_id, is_organizer = is_organizer, admin_id = admin_id, "Setting organizer status");

        let existing_user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        let update_request = UpdateUserRequest {
            is_organizer: Some(is_organizer),
            ..Default::default()
        };

        self.user_repository.update(existing_user.id, update_request).await
    }

    /// Grant or revoke the admin role
    pub async fn set_admin_status(&self, telegram_id: i64, is_admin: bool, admin_id: i64) -> Result<User> {
        let existing_user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        if is_admin {
            warn!(telegram_id = telegram_id, user_id = existing_user.id, admin_id = admin_id, "Admin role granted");
        } else {
            info!(telegram_id = telegram_id, user_id = existing_user.id, admin_id = admin_id, "Admin role revoked");
        }

        let update_request = UpdateUserRequest {
            is_admin: Some(is_admin),
            ..Default::default()
        };

        self.user_repository.update(existing_user.id, update_request).await
    }

    /// Toggle admin/organizer notification preferences
    pub async fn set_notification_preferences(
        &self,
        telegram_id: i64,
        admin_notifications: Option<bool>,
        organizer_notifications: Option<bool>,
    ) -> Result<User> {
        debug!(telegram_id = telegram_id, "Updating notification preferences");

        let existing_user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        let update_request = UpdateUserRequest {
            admin_notifications,
            organizer_notifications,
            ..Default::default()
        };

        self.user_repository.update(existing_user.id, update_request).await
    }

    /// Record the storage key of an uploaded profile image
    pub async fn set_profile_image(&self, telegram_id: i64, image_key: String) -> Result<User> {
        let existing_user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        let update_request = UpdateUserRequest {
            profile_image_key: Some(image_key),
            ..Default::default()
        };

        self.user_repository.update(existing_user.id, update_request).await
    }

    /// Get user statistics
    pub async fn get_user_statistics(&self) -> Result<HashMap<String, i64>> {
        debug!("Getting user statistics");

        let total_users = self.user_repository.count().await?;
        let admins = self.user_repository.admins_with_notifications().await?.len() as i64;
        let organizers = self.user_repository.organizers_with_notifications().await?.len() as i64;

        let mut stats = HashMap::new();
        stats.insert("total_users".to_string(), total_users);
        stats.insert("admins_with_notifications".to_string(), admins);
        stats.insert("organizers_with_notifications".to_string(), organizers);

        Ok(stats)
    }

    /// List users with pagination
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        if limit > 100 {
            return Err(GatherlyError::InvalidInput("Limit cannot exceed 100".to_string()));
        }

        self.user_repository.list(limit, offset).await
    }

    /// Organizers who opted into organizer broadcasts
    pub async fn organizers_to_notify(&self) -> Result<Vec<User>> {
        self.user_repository.organizers_with_notifications().await
    }

    /// Admins who opted into admin broadcasts
    pub async fn admins_to_notify(&self) -> Result<Vec<User>> {
        self.user_repository.admins_with_notifications().await
    }
}
