//! User model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub admin_notifications: bool,
    pub is_organizer: bool,
    pub organizer_notifications: bool,
    pub profile_image_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full display name, falls back to the username or the Telegram id
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .username
                .clone()
                .unwrap_or_else(|| format!("user {}", self.telegram_id)),
        }
    }

    /// A profile is complete once name and contact details are filled in
    pub fn profile_complete(&self) -> bool {
        self.first_name.is_some() && self.last_name.is_some() && self.email.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_admin: Option<bool>,
    pub admin_notifications: Option<bool>,
    pub is_organizer: Option<bool>,
    pub organizer_notifications: Option<bool>,
    pub profile_image_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_user() -> User {
        User {
            id: 1,
            telegram_id: 100,
            username: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            is_admin: false,
            admin_notifications: true,
            is_organizer: false,
            organizer_notifications: true,
            profile_image_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = bare_user();
        assert_eq!(user.display_name(), "user 100");

        user.username = Some("dancer".to_string());
        assert_eq!(user.display_name(), "dancer");

        user.first_name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");

        user.last_name = Some("Lovelace".to_string());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_complete() {
        let mut user = bare_user();
        assert!(!user.profile_complete());

        user.first_name = Some("Ada".to_string());
        user.last_name = Some("Lovelace".to_string());
        assert!(!user.profile_complete());

        user.email = Some("ada@example.com".to_string());
        assert!(user.profile_complete());
    }
}
