//! Event repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::event::{Event, EventEntrant, EntrantStatus, CreateEventRequest, UpdateEventRequest};
use crate::utils::errors::GatherlyError;

const EVENT_COLUMNS: &str = "id, name, description, rules, deadline, start_date, ticket_price, capacity, facility_id, poster_key, geolocation_required, created_by, is_active, created_at, updated_at";
const ENTRANT_COLUMNS: &str = "id, event_id, user_id, status, joined_at";

/// Outcome of a capacity-checked waiting list insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    WaitingListFull,
    AlreadyEntered,
    EventMissing,
}

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, description, rules, deadline, start_date, ticket_price, capacity, facility_id, geolocation_required, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(request.name)
        .bind(request.description)
        .bind(request.rules)
        .bind(request.deadline)
        .bind(request.start_date)
        .bind(request.ticket_price)
        .bind(request.capacity)
        .bind(request.facility_id)
        .bind(request.geolocation_required)
        .bind(request.created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Update event
    pub async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event, GatherlyError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                rules = COALESCE($4, rules),
                deadline = COALESCE($5, deadline),
                start_date = COALESCE($6, start_date),
                ticket_price = COALESCE($7, ticket_price),
                capacity = COALESCE($8, capacity),
                facility_id = COALESCE($9, facility_id),
                poster_key = COALESCE($10, poster_key),
                geolocation_required = COALESCE($11, geolocation_required),
                is_active = COALESCE($12, is_active),
                updated_at = $13
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.rules)
        .bind(request.deadline)
        .bind(request.start_date)
        .bind(request.ticket_price)
        .bind(request.capacity)
        .bind(request.facility_id)
        .bind(request.poster_key)
        .bind(request.geolocation_required)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Delete event and its entrant rows
    pub async fn delete(&self, id: i64) -> Result<(), GatherlyError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List active upcoming events, soonest deadline first
    pub async fn list_available(&self, limit: i64, offset: i64) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE is_active = true AND start_date > NOW() ORDER BY deadline ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events related to a user: created by them or entered by them
    pub async fn list_related(&self, user_id: i64) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT DISTINCT e.id, e.name, e.description, e.rules, e.deadline, e.start_date, e.ticket_price, e.capacity, e.facility_id, e.poster_key, e.geolocation_required, e.created_by, e.is_active, e.created_at, e.updated_at
            FROM events e
            LEFT JOIN event_entrants ee ON e.id = ee.event_id AND ee.user_id = $1
            WHERE e.created_by = $1 OR ee.user_id = $1
            ORDER BY e.start_date ASC
            "#,
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events hosted at a facility
    pub async fn list_by_facility(&self, facility_id: i64) -> Result<Vec<Event>, GatherlyError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE facility_id = $1 AND is_active = true ORDER BY start_date ASC"
        ))
        .bind(facility_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Append a user to the waiting list if and only if there is room.
    ///
    /// The capacity check and the insert run inside one transaction that
    /// locks the event row, so two concurrent joiners near the boundary
    /// cannot both pass the check. Admits strictly fewer than `capacity`
    /// existing waiting entrants.
    pub async fn join_waiting_list(&self, event_id: i64, user_id: i64) -> Result<JoinOutcome, GatherlyError> {
        let mut tx = self.pool.begin().await?;

        let capacity: Option<(i32,)> =
            sqlx::query_as("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((capacity,)) = capacity else {
            return Ok(JoinOutcome::EventMissing);
        };

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM event_entrants WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            return Ok(JoinOutcome::AlreadyEntered);
        }

        let waiting: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_entrants WHERE event_id = $1 AND status = $2"
        )
        .bind(event_id)
        .bind(EntrantStatus::Waiting.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if waiting.0 >= capacity as i64 {
            return Ok(JoinOutcome::WaitingListFull);
        }

        sqlx::query(
            "INSERT INTO event_entrants (event_id, user_id, status, joined_at) VALUES ($1, $2, $3, $4)"
        )
        .bind(event_id)
        .bind(user_id)
        .bind(EntrantStatus::Waiting.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(JoinOutcome::Joined)
    }

    /// Remove a user's entrant row entirely (leave event)
    pub async fn remove_entrant(&self, event_id: i64, user_id: i64) -> Result<bool, GatherlyError> {
        let result = sqlx::query("DELETE FROM event_entrants WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Look up which partition a user occupies for an event
    pub async fn entrant_status(&self, event_id: i64, user_id: i64) -> Result<Option<EntrantStatus>, GatherlyError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM event_entrants WHERE event_id = $1 AND user_id = $2"
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(status,)| EntrantStatus::parse(&status)))
    }

    /// All entrant rows of one partition, oldest first
    pub async fn entrants_by_status(&self, event_id: i64, status: EntrantStatus) -> Result<Vec<EventEntrant>, GatherlyError> {
        let entrants = sqlx::query_as::<_, EventEntrant>(&format!(
            "SELECT {ENTRANT_COLUMNS} FROM event_entrants WHERE event_id = $1 AND status = $2 ORDER BY joined_at ASC"
        ))
        .bind(event_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(entrants)
    }

    /// Move a user to another partition
    pub async fn set_entrant_status(&self, event_id: i64, user_id: i64, status: EntrantStatus) -> Result<EventEntrant, GatherlyError> {
        let entrant = sqlx::query_as::<_, EventEntrant>(&format!(
            r#"
            UPDATE event_entrants
            SET status = $3
            WHERE event_id = $1 AND user_id = $2
            RETURNING {ENTRANT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(entrant)
    }

    /// Number of entrants currently in one partition
    pub async fn count_by_status(&self, event_id: i64, status: EntrantStatus) -> Result<i64, GatherlyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_entrants WHERE event_id = $1 AND status = $2"
        )
        .bind(event_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, GatherlyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Poster keys for every event that has one (admin image browser)
    pub async fn list_poster_keys(&self) -> Result<Vec<String>, GatherlyError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT poster_key FROM events WHERE poster_key IS NOT NULL ORDER BY updated_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// Clear a poster reference after the stored object is deleted
    pub async fn clear_poster_key(&self, key: &str) -> Result<u64, GatherlyError> {
        let result = sqlx::query(
            "UPDATE events SET poster_key = NULL, updated_at = $2 WHERE poster_key = $1"
        )
        .bind(key)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_repository_creation() {
        // This would require a test database setup
        // For now, just test that the repository can be created
        let pool = PgPool::connect("postgresql://test").await;
        if let Ok(pool) = pool {
            let repo = EventRepository::new(pool);
            assert!(!repo.pool.is_closed());
        }
    }

    #[test]
    fn test_join_outcome_equality() {
        assert_eq!(JoinOutcome::Joined, JoinOutcome::Joined);
        assert_ne!(JoinOutcome::Joined, JoinOutcome::WaitingListFull);
    }
}
