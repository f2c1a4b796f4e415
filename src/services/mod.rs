//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod event;
pub mod facility;
pub mod notification;
pub mod redis;
pub mod storage;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthService, AuthContext, Role};
pub use event::{EventService, EntrantLists, DrawResult};
pub use facility::FacilityService;
pub use notification::{NotificationService, NotificationStats};
pub use redis::{RedisService, CacheEntry};
pub use storage::{StorageService, StorageObject, StorageListResponse};
pub use user::UserService;

use teloxide::Bot;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub user_service: UserService,
    pub event_service: EventService,
    pub facility_service: FacilityService,
    pub auth_service: AuthService,
    pub storage_service: StorageService,
    pub notification_service: NotificationService,
    pub redis_service: RedisService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(bot: Bot, settings: Settings, database: DatabaseService) -> Result<Self> {
        let user_service = UserService::new(database.users.clone(), settings.clone());
        let event_service = EventService::new(database.events.clone(), settings.clone());
        let facility_service = FacilityService::new(database.facilities.clone());
        let auth_service = AuthService::new(database.users.clone(), settings.clone());
        let redis_service = RedisService::new(settings.clone())?;
        let storage_service = StorageService::new(redis_service.clone(), settings)?;
        let notification_service = NotificationService::new(bot);

        Ok(Self {
            database,
            user_service,
            event_service,
            facility_service,
            auth_service,
            storage_service,
            notification_service,
            redis_service,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = self.redis_service.health_check().await.unwrap_or(false);

        ServiceHealthStatus {
            redis_healthy,
            user_service_ready: true,
            event_service_ready: true,
            notification_service_ready: true,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub redis_healthy: bool,
    pub user_service_ready: bool,
    pub event_service_ready: bool,
    pub notification_service_ready: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.user_service_ready && self.event_service_ready && self.notification_service_ready
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }
        if !self.user_service_ready {
            issues.push("User service not ready".to_string());
        }
        if !self.event_service_ready {
            issues.push("Event service not ready".to_string());
        }
        if !self.notification_service_ready {
            issues.push("Notification service not ready".to_string());
        }

        issues
    }
}
