//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub ticket_price: i64,
    pub capacity: i32,
    pub facility_id: Option<i64>,
    pub poster_key: Option<String>,
    pub geolocation_required: bool,
    pub created_by: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single entrant row, each user occupies exactly one partition per event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventEntrant {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub ticket_price: i64,
    pub capacity: i32,
    pub facility_id: Option<i64>,
    pub geolocation_required: bool,
    pub created_by: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub ticket_price: Option<i64>,
    pub capacity: Option<i32>,
    pub facility_id: Option<i64>,
    pub poster_key: Option<String>,
    pub geolocation_required: Option<bool>,
    pub is_active: Option<bool>,
}

/// The five registration partitions an entrant can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntrantStatus {
    Waiting,
    Attending,
    Unlucky,
    Declined,
    Removed,
}

impl EntrantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrantStatus::Waiting => "waiting",
            EntrantStatus::Attending => "attending",
            EntrantStatus::Unlucky => "unlucky",
            EntrantStatus::Declined => "declined",
            EntrantStatus::Removed => "removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(EntrantStatus::Waiting),
            "attending" => Some(EntrantStatus::Attending),
            "unlucky" => Some(EntrantStatus::Unlucky),
            "declined" => Some(EntrantStatus::Declined),
            "removed" => Some(EntrantStatus::Removed),
            _ => None,
        }
    }

    /// Human-readable partition label
    pub fn label(&self) -> &'static str {
        match self {
            EntrantStatus::Waiting => "Waiting list",
            EntrantStatus::Attending => "Attendees",
            EntrantStatus::Unlucky => "Unlucky",
            EntrantStatus::Declined => "Declined",
            EntrantStatus::Removed => "Removed",
        }
    }

    /// Allowed partition moves, everything else is rejected
    pub fn can_transition_to(&self, to: EntrantStatus) -> bool {
        matches!(
            (self, to),
            (EntrantStatus::Waiting, EntrantStatus::Attending)
                | (EntrantStatus::Waiting, EntrantStatus::Unlucky)
                | (EntrantStatus::Waiting, EntrantStatus::Removed)
                | (EntrantStatus::Attending, EntrantStatus::Declined)
                | (EntrantStatus::Attending, EntrantStatus::Removed)
                | (EntrantStatus::Unlucky, EntrantStatus::Attending)
        )
    }

    pub fn all() -> [EntrantStatus; 5] {
        [
            EntrantStatus::Waiting,
            EntrantStatus::Attending,
            EntrantStatus::Unlucky,
            EntrantStatus::Declined,
            EntrantStatus::Removed,
        ]
    }
}

impl ToString for EntrantStatus {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in EntrantStatus::all() {
            assert_eq!(EntrantStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EntrantStatus::parse("lucky"), None);
    }

    #[test]
    fn test_partition_transitions() {
        assert!(EntrantStatus::Waiting.can_transition_to(EntrantStatus::Attending));
        assert!(EntrantStatus::Waiting.can_transition_to(EntrantStatus::Unlucky));
        assert!(EntrantStatus::Unlucky.can_transition_to(EntrantStatus::Attending));
        assert!(EntrantStatus::Attending.can_transition_to(EntrantStatus::Declined));

        assert!(!EntrantStatus::Declined.can_transition_to(EntrantStatus::Attending));
        assert!(!EntrantStatus::Removed.can_transition_to(EntrantStatus::Waiting));
        assert!(!EntrantStatus::Attending.can_transition_to(EntrantStatus::Waiting));
    }
}
