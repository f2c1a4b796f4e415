//! Test fixtures and data for integration tests
//!
//! This module provides builder-style fixtures for users, events and
//! facilities used across the integration tests.

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};

/// Test user data structure
#[derive(Debug, Clone)]
pub struct TestUser {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_organizer: bool,
}

impl TestUser {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            username: Some(format!("user_{}", telegram_id)),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            email: SafeEmail().fake(),
            is_admin: false,
            is_organizer: false,
        }
    }

    pub fn organizer(mut self) -> Self {
        self.is_organizer = true;
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// Test event data structure
#[derive(Debug, Clone)]
pub struct TestEvent {
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub ticket_price: i64,
    pub capacity: i32,
}

impl TestEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: "A test event".to_string(),
            deadline: Utc::now() + Duration::days(7),
            start_date: Utc::now() + Duration::days(14),
            ticket_price: 0,
            capacity: 10,
        }
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_price(mut self, cents: i64) -> Self {
        self.ticket_price = cents;
        self
    }
}

/// Test facility data structure
#[derive(Debug, Clone)]
pub struct TestFacility {
    pub name: String,
    pub description: Option<String>,
}

impl TestFacility {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: Some("A test venue".to_string()),
        }
    }
}

/// Standard cast of users for multi-user scenarios
pub struct UserFixtures {
    pub entrant: TestUser,
    pub organizer: TestUser,
    pub admin: TestUser,
}

impl UserFixtures {
    pub fn standard() -> Self {
        Self {
            entrant: TestUser::new(1001),
            organizer: TestUser::new(1002).organizer(),
            admin: TestUser::new(1003).admin(),
        }
    }
}
