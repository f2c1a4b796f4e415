//! Authentication service implementation
//!
//! This service resolves an explicit authentication context for every
//! privileged interaction: role-based access control for organizer and
//! admin operations, backed by the configured bootstrap admin list and
//! the per-user role flags in the database.

use tracing::{warn, debug};
use crate::config::settings::Settings;
use crate::database::repositories::UserRepository;
use crate::models::{Event, Facility, User};
use crate::utils::errors::{GatherlyError, Result};

/// Role levels for bot operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Regular entrant
    User,
    /// Can create events and facilities and manage their own
    Organizer,
    /// Full access, including global listings and moderation
    Admin,
}

/// Authentication context for a user interaction
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub telegram_id: i64,
    pub role: Role,
    pub is_bootstrap_admin: bool,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_organizer(&self) -> bool {
        self.role >= Role::Organizer
    }
}

/// Authentication service for managing permissions and access control
#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    settings: Settings,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(user_repository: UserRepository, settings: Settings) -> Self {
        Self { user_repository, settings }
    }

    /// Check if a Telegram id is in the configured bootstrap admin list
    pub fn is_bootstrap_admin(&self, telegram_id: i64) -> bool {
        self.settings.bot.admin_ids.contains(&telegram_id)
    }

    /// Whether the admin panel feature is switched on
    pub fn admin_panel_enabled(&self) -> bool {
        self.settings.features.admin_panel
    }

    /// Resolve the role for an already-loaded user row
    pub fn role_of(&self, user: &User) -> Role {
        if user.is_admin || self.is_bootstrap_admin(user.telegram_id) {
            Role::Admin
        } else if user.is_organizer {
            Role::Organizer
        } else {
            Role::User
        }
    }

    /// Get authentication context for a Telegram user
    pub async fn get_auth_context(&self, telegram_id: i64) -> Result<AuthContext> {
        debug!(telegram_id = telegram_id, "Resolving authentication context");

        let user = self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(GatherlyError::UserNotFound { user_id: telegram_id })?;

        let context = AuthContext {
            user_id: user.id,
            telegram_id,
            role: self.role_of(&user),
            is_bootstrap_admin: self.is_bootstrap_admin(telegram_id),
        };

        debug!(telegram_id = telegram_id, role = ?context.role, "Authentication context resolved");
        Ok(context)
    }

    /// Require a role or return a permission error
    pub async fn require_role(&self, telegram_id: i64, required: Role) -> Result<AuthContext> {
        let context = self.get_auth_context(telegram_id).await?;

        if context.role < required {
            warn!(telegram_id = telegram_id, role = ?context.role, required = ?required, "Unauthorized access attempt");
            return Err(GatherlyError::PermissionDenied(
                format!("This action requires the {:?} role", required)
            ));
        }

        Ok(context)
    }

    /// Event management: the creator or an admin
    pub fn can_manage_event(&self, context: &AuthContext, event: &Event) -> bool {
        context.is_admin() || event.created_by == context.user_id
    }

    /// Facility management: the owner or an admin
    pub fn can_manage_facility(&self, context: &AuthContext, facility: &Facility) -> bool {
        context.is_admin() || facility.owner_id == context.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_flags(telegram_id: i64, is_admin: bool, is_organizer: bool) -> User {
        User {
            id: 1,
            telegram_id,
            username: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            is_admin,
            admin_notifications: true,
            is_organizer,
            organizer_notifications: true,
            profile_image_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service_with_admins(admin_ids: Vec<i64>) -> AuthService {
        let mut settings = Settings::default();
        settings.bot.admin_ids = admin_ids;
        // Lazy pool never connects unless a query runs; role resolution is pure.
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/gatherly_test")
            .expect("lazy pool");
        AuthService::new(UserRepository::new(pool), settings)
    }

    #[tokio::test]
    async fn test_role_resolution() {
        let service = service_with_admins(vec![999]);

        assert_eq!(service.role_of(&user_with_flags(1, false, false)), Role::User);
        assert_eq!(service.role_of(&user_with_flags(1, false, true)), Role::Organizer);
        assert_eq!(service.role_of(&user_with_flags(1, true, false)), Role::Admin);
        // Bootstrap admins outrank their stored flags
        assert_eq!(service.role_of(&user_with_flags(999, false, false)), Role::Admin);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Organizer);
        assert!(Role::Organizer > Role::User);
    }

    #[test]
    fn test_auth_context_helpers() {
        let ctx = AuthContext {
            user_id: 1,
            telegram_id: 2,
            role: Role::Organizer,
            is_bootstrap_admin: false,
        };
        assert!(ctx.is_organizer());
        assert!(!ctx.is_admin());
    }
}
