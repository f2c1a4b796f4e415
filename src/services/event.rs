//! Event service implementation
//!
//! This service handles event browsing, the capacity-checked join/leave
//! workflow against the waiting list, organizer partition management, and
//! the draw that promotes waiting entrants.

use rand::seq::SliceRandom;
use tracing::{info, debug, warn};
use crate::config::settings::Settings;
use crate::database::repositories::{EventRepository, JoinOutcome};
use crate::models::event::{Event, EventEntrant, EntrantStatus, CreateEventRequest, UpdateEventRequest};
use crate::utils::errors::{GatherlyError, Result};

/// Entrant rows grouped by partition
#[derive(Debug, Clone, Default)]
pub struct EntrantLists {
    pub waiting: Vec<EventEntrant>,
    pub attending: Vec<EventEntrant>,
    pub unlucky: Vec<EventEntrant>,
    pub declined: Vec<EventEntrant>,
    pub removed: Vec<EventEntrant>,
}

/// Result of a draw over the waiting list
#[derive(Debug, Clone)]
pub struct DrawResult {
    pub selected: Vec<EventEntrant>,
    pub unlucky: Vec<EventEntrant>,
}

/// Event service for browsing and registration workflows
#[derive(Clone)]
pub struct EventService {
    event_repository: EventRepository,
    settings: Settings,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(event_repository: EventRepository, settings: Settings) -> Self {
        Self {
            event_repository,
            settings,
        }
    }

    /// Whether event pages should surface geolocation warnings
    pub fn geolocation_warnings_enabled(&self) -> bool {
        self.settings.features.geolocation_warnings
    }

    /// Whether organizers may manage posters
    pub fn poster_management_enabled(&self) -> bool {
        self.settings.features.poster_management
    }

    /// All active upcoming events for the browse screen
    pub async fn list_available(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        debug!(limit = limit, offset = offset, "Listing available events");
        self.event_repository.list_available(limit, offset).await
    }

    /// Events the user created or entered
    pub async fn list_related(&self, user_id: i64) -> Result<Vec<Event>> {
        debug!(user_id = user_id, "Listing related events");
        self.event_repository.list_related(user_id).await
    }

    /// Events hosted at a facility
    pub async fn list_by_facility(&self, facility_id: i64) -> Result<Vec<Event>> {
        self.event_repository.list_by_facility(facility_id).await
    }

    /// Get event by ID
    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.event_repository.find_by_id(event_id).await?
            .ok_or(GatherlyError::EventNotFound { event_id })
    }

    /// Create a new event after validating dates and capacity
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event> {
        if request.name.trim().is_empty() {
            return Err(GatherlyError::InvalidInput("Event name cannot be empty".to_string()));
        }
        if request.capacity <= 0 {
            return Err(GatherlyError::InvalidInput("Capacity must be greater than 0".to_string()));
        }
        if request.deadline > request.start_date {
            return Err(GatherlyError::InvalidInput(
                "Registration deadline must not be after the start date".to_string()
            ));
        }
        if request.ticket_price < 0 {
            return Err(GatherlyError::InvalidInput("Ticket price cannot be negative".to_string()));
        }

        let event = self.event_repository.create(request).await?;
        info!(event_id = event.id, created_by = event.created_by, "Event created");

        Ok(event)
    }

    /// Update an event
    pub async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<Event> {
        if let Some(capacity) = request.capacity {
            if capacity <= 0 {
                return Err(GatherlyError::InvalidInput("Capacity must be greater than 0".to_string()));
            }
        }

        let event = self.event_repository.update(event_id, request).await?;
        info!(event_id = event_id, "Event updated");
        Ok(event)
    }

    /// Delete an event (admin moderation)
    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        self.event_repository.delete(event_id).await?;
        info!(event_id = event_id, "Event deleted");
        Ok(())
    }

    /// Join the waiting list.
    ///
    /// The capacity check and the append run as one conditional update in
    /// the repository; this method only maps the outcome onto errors the
    /// handlers can surface.
    pub async fn join_event(&self, event_id: i64, user_id: i64) -> Result<EntrantStatus> {
        debug!(event_id = event_id, user_id = user_id, "Join requested");

        match self.event_repository.join_waiting_list(event_id, user_id).await? {
            JoinOutcome::Joined => {
                info!(event_id = event_id, user_id = user_id, "User joined waiting list");
                Ok(EntrantStatus::Waiting)
            }
            JoinOutcome::WaitingListFull => {
                debug!(event_id = event_id, user_id = user_id, "Waiting list full");
                Err(GatherlyError::EventFull { event_id })
            }
            JoinOutcome::AlreadyEntered => {
                Err(GatherlyError::AlreadyEntered { event_id, user_id })
            }
            JoinOutcome::EventMissing => Err(GatherlyError::EventNotFound { event_id }),
        }
    }

    /// Leave an event entirely
    pub async fn leave_event(&self, event_id: i64, user_id: i64) -> Result<()> {
        debug!(event_id = event_id, user_id = user_id, "Leave requested");

        if self.event_repository.remove_entrant(event_id, user_id).await? {
            info!(event_id = event_id, user_id = user_id, "User left event");
            Ok(())
        } else {
            Err(GatherlyError::NotEntered { event_id, user_id })
        }
    }

    /// Which partition a user currently occupies, if any
    pub async fn entrant_status(&self, event_id: i64, user_id: i64) -> Result<Option<EntrantStatus>> {
        self.event_repository.entrant_status(event_id, user_id).await
    }

    /// All five partitions of an event
    pub async fn entrant_lists(&self, event_id: i64) -> Result<EntrantLists> {
        let mut lists = EntrantLists::default();

        for status in EntrantStatus::all() {
            let entrants = self.event_repository.entrants_by_status(event_id, status).await?;
            match status {
                EntrantStatus::Waiting => lists.waiting = entrants,
                EntrantStatus::Attending => lists.attending = entrants,
                EntrantStatus::Unlucky => lists.unlucky = entrants,
                EntrantStatus::Declined => lists.declined = entrants,
                EntrantStatus::Removed => lists.removed = entrants,
            }
        }

        Ok(lists)
    }

    /// Move an entrant between partitions, rejecting undefined transitions
    pub async fn move_entrant(&self, event_id: i64, user_id: i64, to: EntrantStatus) -> Result<EventEntrant> {
        let current = self.event_repository.entrant_status(event_id, user_id).await?
            .ok_or(GatherlyError::NotEntered { event_id, user_id })?;

        if !current.can_transition_to(to) {
            warn!(event_id = event_id, user_id = user_id, from = current.as_str(), to = to.as_str(), "Rejected partition move");
            return Err(GatherlyError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let entrant = self.event_repository.set_entrant_status(event_id, user_id, to).await?;
        info!(event_id = event_id, user_id = user_id, from = current.as_str(), to = to.as_str(), "Entrant moved");

        Ok(entrant)
    }

    /// Randomly promote up to `count` waiting entrants to Attending and mark
    /// everyone left behind as Unlucky
    pub async fn draw_entrants(&self, event_id: i64, count: usize) -> Result<DrawResult> {
        let mut waiting = self.event_repository
            .entrants_by_status(event_id, EntrantStatus::Waiting)
            .await?;

        if waiting.is_empty() {
            return Ok(DrawResult { selected: vec![], unlucky: vec![] });
        }

        waiting.shuffle(&mut rand::thread_rng());
        let selected_count = count.min(waiting.len());
        let remainder = waiting.split_off(selected_count);

        let mut selected = Vec::with_capacity(waiting.len());
        for entrant in waiting {
            let moved = self.event_repository
                .set_entrant_status(event_id, entrant.user_id, EntrantStatus::Attending)
                .await?;
            selected.push(moved);
        }

        let mut unlucky = Vec::with_capacity(remainder.len());
        for entrant in remainder {
            let moved = self.event_repository
                .set_entrant_status(event_id, entrant.user_id, EntrantStatus::Unlucky)
                .await?;
            unlucky.push(moved);
        }

        info!(
            event_id = event_id,
            selected = selected.len(),
            unlucky = unlucky.len(),
            "Entrant draw completed"
        );

        Ok(DrawResult { selected, unlucky })
    }

    /// Current waiting list length against the event capacity
    pub async fn waiting_count(&self, event_id: i64) -> Result<i64> {
        self.event_repository.count_by_status(event_id, EntrantStatus::Waiting).await
    }

    /// Poster keys referenced by events (admin image browser fallback)
    pub async fn poster_keys(&self) -> Result<Vec<String>> {
        self.event_repository.list_poster_keys().await
    }

    /// Clear poster references after the stored object was deleted
    pub async fn detach_poster(&self, key: &str) -> Result<u64> {
        let cleared = self.event_repository.clear_poster_key(key).await?;
        if cleared > 0 {
            info!(key = %key, events = cleared, "Poster detached from events");
        }
        Ok(cleared)
    }
}
