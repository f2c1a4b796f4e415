//! Callback query handlers module
//!
//! This module contains the dispatcher for all inline keyboard button
//! callbacks. Callback data is a colon-separated path: the first segment
//! picks the area (event, facility, profile, admin), the second the action,
//! and the rest carries identifiers.

use teloxide::{Bot, types::{CallbackQuery, ChatId}, prelude::*};
use tracing::{debug, warn, error};
use crate::utils::errors::Result;
use crate::models::EntrantStatus;
use crate::services::ServiceFactory;
use crate::state::{ScenarioManager, StateStorage};
use crate::handlers::commands::{start, events, facilities, admin};

/// Main callback query dispatcher
pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let user = query.from;
    let telegram_id = user.id.0 as i64;
    let chat_id = query.message.as_ref().map(|m| m.chat().id);

    let Some(data) = query.data else {
        return Ok(());
    };

    debug!(telegram_id = telegram_id, callback_data = %data, "Processing callback query");

    // Answer first to clear the loading state on the button
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let parts: Vec<&str> = data.split(':').collect();
    if parts.is_empty() {
        warn!(data = %data, "Invalid callback data format");
        return Ok(());
    }

    let area = parts[0];
    let chat_id = chat_id.unwrap_or(ChatId(telegram_id));

    let result = match area {
        "event" => {
            handle_event_callback(bot, chat_id, telegram_id, &parts, services, scenario_manager, state_storage).await
        }
        "event_create" => {
            let confirmed = parts.get(1) == Some(&"confirm");
            events::handle_event_create_confirm_callback(bot, chat_id, telegram_id, confirmed, services, state_storage).await
        }
        "facility" => {
            handle_facility_callback(bot, chat_id, telegram_id, &parts, services, scenario_manager, state_storage).await
        }
        "profile" => {
            match parts.get(1) {
                Some(&"edit") => {
                    start::handle_profile_edit_callback(bot, chat_id, telegram_id, scenario_manager, state_storage).await
                }
                Some(&"photo") => {
                    start::handle_profile_photo_callback(bot, chat_id, telegram_id, scenario_manager, state_storage).await
                }
                Some(&"notif") => {
                    let kind = parts.get(2).copied().unwrap_or("");
                    start::handle_notification_toggle_callback(bot, chat_id, telegram_id, kind, services).await
                }
                _ => {
                    warn!(data = %data, "Unknown profile action");
                    Ok(())
                }
            }
        }
        "admin" => {
            let action = parts.get(1).copied().unwrap_or("").to_string();
            admin::handle_admin_callback(bot, chat_id, telegram_id, action, services, state_storage).await
        }
        other => {
            warn!(area = %other, "Unknown callback area");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(telegram_id = telegram_id, callback_data = %data, error = %e, "Callback handler failed");
        return Err(e);
    }

    Ok(())
}

/// Event area callbacks
async fn handle_event_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    parts: &[&str],
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let action = parts.get(1).copied().unwrap_or("");

    if action == "back" {
        return events::render_events_list(&bot, chat_id, &services).await;
    }

    let Some(event_id) = parts.get(2).and_then(|raw| raw.parse::<i64>().ok()) else {
        warn!(parts = ?parts, "Event callback without a valid id");
        return Ok(());
    };

    match action {
        "view" => events::handle_event_view_callback(bot, chat_id, telegram_id, event_id, services).await,
        "join" => events::handle_join_callback(bot, chat_id, telegram_id, event_id, services).await,
        "leave" => events::handle_leave_callback(bot, chat_id, event_id).await,
        "leave_confirm" => {
            events::handle_leave_confirm_callback(bot, chat_id, telegram_id, event_id, services).await
        }
        "entrants" => events::handle_entrants_callback(bot, chat_id, telegram_id, event_id, services).await,
        "draw" => events::handle_draw_callback(bot, chat_id, telegram_id, event_id, services).await,
        "poster" => {
            events::handle_poster_callback(bot, chat_id, telegram_id, event_id, services, scenario_manager, state_storage).await
        }
        "delete" => events::handle_event_delete_callback(bot, chat_id, telegram_id, event_id, services).await,
        "delete_confirm" => {
            events::handle_event_delete_confirm_callback(bot, chat_id, telegram_id, event_id, services).await
        }
        "promote" | "remove" | "decline" => {
            let Some(entrant_user_id) = parts.get(3).and_then(|raw| raw.parse::<i64>().ok()) else {
                warn!(parts = ?parts, "Entrant move callback without a user id");
                return Ok(());
            };
            let to = match action {
                "promote" => EntrantStatus::Attending,
                "remove" => EntrantStatus::Removed,
                _ => EntrantStatus::Declined,
            };
            events::handle_entrant_move_callback(bot, chat_id, telegram_id, event_id, entrant_user_id, to, services).await
        }
        other => {
            warn!(action = %other, "Unknown event action");
            Ok(())
        }
    }
}

/// Facility area callbacks
async fn handle_facility_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    parts: &[&str],
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let action = parts.get(1).copied().unwrap_or("");

    if action == "new" {
        return facilities::start_facility_creation(
            bot, chat_id, telegram_id, None, services, scenario_manager, state_storage,
        ).await;
    }

    let Some(facility_id) = parts.get(2).and_then(|raw| raw.parse::<i64>().ok()) else {
        warn!(parts = ?parts, "Facility callback without a valid id");
        return Ok(());
    };

    match action {
        "view" => {
            facilities::handle_facility_view_callback(bot, chat_id, telegram_id, facility_id, services).await
        }
        "events" => facilities::handle_facility_events_callback(bot, chat_id, facility_id, services).await,
        "edit" => {
            facilities::start_facility_creation(
                bot, chat_id, telegram_id, Some(facility_id), services, scenario_manager, state_storage,
            ).await
        }
        "delete" => facilities::handle_facility_delete_callback(bot, chat_id, facility_id).await,
        "delete_confirm" => {
            facilities::handle_facility_delete_confirm_callback(bot, chat_id, telegram_id, facility_id, services).await
        }
        other => {
            warn!(action = %other, "Unknown facility action");
            Ok(())
        }
    }
}
