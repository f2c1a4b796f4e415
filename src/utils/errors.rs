//! Error handling for Gatherly
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for Gatherly application
#[derive(Error, Debug)]
pub enum GatherlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("File download error: {0}")]
    Download(#[from] teloxide::DownloadError),

    #[error("Object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Facility not found: {facility_id}")]
    FacilityNotFound { facility_id: i64 },

    #[error("Event {event_id} waiting list is full")]
    EventFull { event_id: i64 },

    #[error("User {user_id} already entered event {event_id}")]
    AlreadyEntered { event_id: i64, user_id: i64 },

    #[error("User {user_id} is not an entrant of event {event_id}")]
    NotEntered { event_id: i64, user_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Object storage specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    RequestFailed(String),

    #[error("Storage request timed out")]
    Timeout,

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("Storage service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Gatherly operations
pub type Result<T> = std::result::Result<T, GatherlyError>;

/// Result type alias for object storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl GatherlyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            GatherlyError::Database(_) => false,
            GatherlyError::Migration(_) => false,
            GatherlyError::Telegram(_) => true,
            GatherlyError::Download(_) => true,
            GatherlyError::Storage(_) => true,
            GatherlyError::Config(_) => false,
            GatherlyError::PermissionDenied(_) => false,
            GatherlyError::UserNotFound { .. } => false,
            GatherlyError::EventNotFound { .. } => false,
            GatherlyError::FacilityNotFound { .. } => false,
            GatherlyError::EventFull { .. } => true,
            GatherlyError::AlreadyEntered { .. } => false,
            GatherlyError::NotEntered { .. } => false,
            GatherlyError::InvalidStateTransition { .. } => false,
            GatherlyError::Redis(_) => true,
            GatherlyError::Http(_) => true,
            GatherlyError::Serialization(_) => false,
            GatherlyError::Io(_) => true,
            GatherlyError::UrlParse(_) => false,
            GatherlyError::InvalidInput(_) => false,
            GatherlyError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GatherlyError::Database(_) => ErrorSeverity::Critical,
            GatherlyError::Migration(_) => ErrorSeverity::Critical,
            GatherlyError::Config(_) => ErrorSeverity::Critical,
            GatherlyError::PermissionDenied(_) => ErrorSeverity::Warning,
            GatherlyError::EventFull { .. } => ErrorSeverity::Info,
            GatherlyError::AlreadyEntered { .. } => ErrorSeverity::Info,
            GatherlyError::NotEntered { .. } => ErrorSeverity::Info,
            GatherlyError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_user_facing() {
        let full = GatherlyError::EventFull { event_id: 7 };
        assert!(full.is_recoverable());
        assert_eq!(full.severity(), ErrorSeverity::Info);

        let dup = GatherlyError::AlreadyEntered { event_id: 7, user_id: 42 };
        assert!(!dup.is_recoverable());
        assert_eq!(dup.severity(), ErrorSeverity::Info);
    }

    #[test]
    fn test_storage_error_wraps_into_main_error() {
        let err: GatherlyError = StorageError::NotFound("event_posters/missing.jpg".to_string()).into();
        assert!(err.to_string().contains("event_posters/missing.jpg"));
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }
}
