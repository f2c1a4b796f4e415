//! Facility repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::facility::{Facility, CreateFacilityRequest, UpdateFacilityRequest};
use crate::utils::errors::GatherlyError;

const FACILITY_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct FacilityRepository {
    pool: PgPool,
}

impl FacilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new facility
    pub async fn create(&self, request: CreateFacilityRequest) -> Result<Facility, GatherlyError> {
        let facility = sqlx::query_as::<_, Facility>(&format!(
            r#"
            INSERT INTO facilities (name, description, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FACILITY_COLUMNS}
            "#
        ))
        .bind(request.name)
        .bind(request.description)
        .bind(request.owner_id)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(facility)
    }

    /// Find facility by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Facility>, GatherlyError> {
        let facility = sqlx::query_as::<_, Facility>(&format!(
            "SELECT {FACILITY_COLUMNS} FROM facilities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(facility)
    }

    /// Update facility
    pub async fn update(&self, id: i64, request: UpdateFacilityRequest) -> Result<Facility, GatherlyError> {
        let facility = sqlx::query_as::<_, Facility>(&format!(
            r#"
            UPDATE facilities
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING {FACILITY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(facility)
    }

    /// Delete facility
    pub async fn delete(&self, id: i64) -> Result<(), GatherlyError> {
        sqlx::query("DELETE FROM facilities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List all facilities with pagination (admin view)
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Facility>, GatherlyError> {
        let facilities = sqlx::query_as::<_, Facility>(&format!(
            "SELECT {FACILITY_COLUMNS} FROM facilities ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(facilities)
    }

    /// List facilities owned by a user
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Facility>, GatherlyError> {
        let facilities = sqlx::query_as::<_, Facility>(&format!(
            "SELECT {FACILITY_COLUMNS} FROM facilities WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(facilities)
    }

    /// Count total facilities
    pub async fn count(&self) -> Result<i64, GatherlyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM facilities")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_facility_repository_creation() {
        let pool = PgPool::connect("postgresql://test").await;
        if let Ok(pool) = pool {
            let repo = FacilityRepository::new(pool);
            assert!(!repo.pool.is_closed());
        }
    }
}
