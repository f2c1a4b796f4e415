//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{DatabasePool, UserRepository, EventRepository, FacilityRepository};
use crate::utils::errors::GatherlyError;

#[derive(Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub facilities: FacilityRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            facilities: FacilityRepository::new(pool),
        }
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> Result<serde_json::Value, GatherlyError> {
        let total_users = self.users.count().await?;
        let total_events = self.events.count().await?;
        let total_facilities = self.facilities.count().await?;

        let stats = serde_json::json!({
            "total_users": total_users,
            "total_events": total_events,
            "total_facilities": total_facilities
        });

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_service_creation() {
        // This would require a test database setup
        // For now, just test that the service can be created
        let pool = sqlx::PgPool::connect("postgresql://test").await;
        if let Ok(pool) = pool {
            let service = DatabaseService::new(pool);
            let _ = &service.users;
            let _ = &service.events;
            let _ = &service.facilities;
        }
    }
}
