//! Notification service implementation
//!
//! This service handles message formatting and sending: entrant status
//! notices, organizer broadcasts to their entrants, and admin broadcasts,
//! honoring the per-user notification preference flags.

use std::collections::HashMap;
use teloxide::{Bot, types::ChatId, requests::Requester};
use tracing::{info, warn, error, debug};
use crate::models::{User, Event, EntrantStatus};
use crate::utils::errors::{GatherlyError, Result};

/// Outcome summary of a bulk send
#[derive(Debug, Clone, Default)]
pub struct NotificationStats {
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// Notification service for message handling
#[derive(Clone)]
pub struct NotificationService {
    bot: Bot,
    templates: HashMap<String, String>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            templates: Self::load_default_templates(),
        }
    }

    /// Send a templated message to a single Telegram user
    pub async fn send_notification(
        &self,
        telegram_id: i64,
        template_key: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<()> {
        debug!(telegram_id = telegram_id, template_key = %template_key, "Sending notification");

        let text = self.format_message(template_key, parameters)?;

        match self.bot.send_message(ChatId(telegram_id), text).await {
            Ok(_) => {
                info!(telegram_id = telegram_id, template_key = %template_key, "Notification sent successfully");
                Ok(())
            }
            Err(e) => {
                error!(telegram_id = telegram_id, template_key = %template_key, error = %e, "Failed to send notification");
                Err(GatherlyError::Telegram(e))
            }
        }
    }

    /// Tell an entrant which partition they landed in
    pub async fn notify_status_change(&self, user: &User, event: &Event, status: EntrantStatus) -> Result<()> {
        let template_key = match status {
            EntrantStatus::Attending => "entrant.selected",
            EntrantStatus::Unlucky => "entrant.unlucky",
            EntrantStatus::Declined => "entrant.declined",
            EntrantStatus::Removed => "entrant.removed",
            EntrantStatus::Waiting => "entrant.waiting",
        };

        let mut params = HashMap::new();
        params.insert("event_name".to_string(), event.name.clone());

        self.send_notification(user.telegram_id, template_key, &params).await
    }

    /// Broadcast to a set of users, honoring their notification preference.
    ///
    /// `prefers` selects the flag to honor (admin vs organizer broadcasts);
    /// a failed send is logged and counted, never fatal.
    pub async fn broadcast(
        &self,
        recipients: &[User],
        template_key: &str,
        parameters: &HashMap<String, String>,
        prefers: fn(&User) -> bool,
    ) -> Result<NotificationStats> {
        info!(count = recipients.len(), template_key = %template_key, "Sending broadcast");

        let text = self.format_message(template_key, parameters)?;
        let mut stats = NotificationStats::default();

        for user in recipients {
            if !prefers(user) {
                stats.skipped += 1;
                continue;
            }

            match self.bot.send_message(ChatId(user.telegram_id), text.clone()).await {
                Ok(_) => stats.sent += 1,
                Err(e) => {
                    warn!(telegram_id = user.telegram_id, error = %e, "Broadcast send failed");
                    stats.failed += 1;
                }
            }
        }

        info!(sent = stats.sent, failed = stats.failed, skipped = stats.skipped, "Broadcast completed");
        Ok(stats)
    }

    /// Fill a template with `{name}` parameters
    pub fn format_message(&self, template_key: &str, parameters: &HashMap<String, String>) -> Result<String> {
        let template = self.templates.get(template_key)
            .ok_or_else(|| GatherlyError::InvalidInput(format!("Unknown template: {}", template_key)))?;

        let mut message = template.clone();
        for (key, value) in parameters {
            message = message.replace(&format!("{{{}}}", key), value);
        }

        Ok(message)
    }

    fn load_default_templates() -> HashMap<String, String> {
        let mut templates = HashMap::new();

        templates.insert(
            "entrant.waiting".to_string(),
            "You are on the waiting list for {event_name}.".to_string(),
        );
        templates.insert(
            "entrant.selected".to_string(),
            "🎉 You were selected for {event_name}! See the event page for details.".to_string(),
        );
        templates.insert(
            "entrant.unlucky".to_string(),
            "The draw for {event_name} did not select you this time.".to_string(),
        );
        templates.insert(
            "entrant.declined".to_string(),
            "Your spot for {event_name} was marked as declined.".to_string(),
        );
        templates.insert(
            "entrant.removed".to_string(),
            "You were removed from {event_name} by the organizer.".to_string(),
        );
        templates.insert(
            "organizer.event_created".to_string(),
            "New event published: {event_name} — registration closes {deadline}.".to_string(),
        );
        templates.insert(
            "admin.facility_created".to_string(),
            "New facility registered: {facility_name}.".to_string(),
        );

        templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> NotificationService {
        NotificationService::new(Bot::new("12345:test_token"))
    }

    #[test]
    fn test_format_message_substitutes_parameters() {
        let service = test_service();
        let mut params = HashMap::new();
        params.insert("event_name".to_string(), "Summer Dance".to_string());

        let message = service.format_message("entrant.selected", &params).expect("format");
        assert!(message.contains("Summer Dance"));
        assert!(!message.contains("{event_name}"));
    }

    #[test]
    fn test_format_message_unknown_template() {
        let service = test_service();
        let params = HashMap::new();
        assert!(service.format_message("no.such.template", &params).is_err());
    }
}
