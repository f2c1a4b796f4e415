//! Facility command handlers
//!
//! The facility list screen (own facilities, or every facility in admin
//! mode), facility creation and editing flows, and facility detail view.

use std::collections::HashMap;
use teloxide::{Bot, types::{ChatId, Message, InlineKeyboardMarkup, InlineKeyboardButton}, prelude::*};
use tracing::{info, debug, warn, error};
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::truncate_text;
use crate::models::UpdateFacilityRequest;
use crate::services::{ServiceFactory, Role};
use crate::state::{ConversationContext, ScenarioManager, StateStorage};

const FACILITIES_PAGE_SIZE: i64 = 50;

/// Handle /facilities command: own facilities, or all of them for admins
pub async fn handle_facilities_list(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let telegram_id = user.id.0 as i64;

    let auth = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => auth,
        Err(GatherlyError::UserNotFound { .. }) => {
            bot.send_message(msg.chat.id, "No profile yet. Send /start first.").await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let facilities = match services.facility_service.list_for(&auth, FACILITIES_PAGE_SIZE, 0).await {
        Ok(facilities) => facilities,
        Err(e) => {
            error!(user_id = auth.user_id, error = %e, "Failed to fetch facilities");
            bot.send_message(msg.chat.id, "Error loading facilities").await?;
            return Ok(());
        }
    };

    let title = if auth.is_admin() {
        format!("🏛 All facilities ({}):", facilities.len())
    } else {
        format!("🏛 Your facilities ({}):", facilities.len())
    };

    let mut keyboard_rows: Vec<Vec<InlineKeyboardButton>> = facilities
        .iter()
        .map(|facility| {
            vec![InlineKeyboardButton::callback(
                format!("#{} · {}", facility.id, truncate_text(&facility.name, 40)),
                format!("facility:view:{}", facility.id),
            )]
        })
        .collect();

    if auth.is_organizer() {
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            "➕ New facility",
            "facility:new",
        )]);
    }

    bot.send_message(msg.chat.id, title)
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Handle /newfacility command: organizers start the facility creation flow
pub async fn handle_new_facility(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let telegram_id = user.id.0 as i64;

    start_facility_creation(bot, msg.chat.id, telegram_id, None, services, scenario_manager, state_storage).await
}

/// Start the facility creation flow, optionally editing an existing record
pub async fn start_facility_creation(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    edit_facility_id: Option<i64>,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    if let Err(e) = services.auth_service.require_role(telegram_id, Role::Organizer).await {
        debug!(telegram_id = telegram_id, error = %e, "facility creation denied");
        bot.send_message(chat_id, "Only organizers can manage facilities.").await?;
        return Ok(());
    }

    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "facility_creation")?;
    if let Some(facility_id) = edit_facility_id {
        context.set_data("edit_facility_id", facility_id)?;
    }
    state_storage.save_context(&context).await?;

    let step = scenario_manager.get_current_step(&context)?;
    let intro = if edit_facility_id.is_some() {
        "Editing the facility."
    } else {
        "Let's register a facility."
    };
    bot.send_message(chat_id, format!("{}\n\n{}", intro, step.prompt)).await?;

    Ok(())
}

/// Facility detail view with owner controls
pub async fn handle_facility_view_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    facility_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let facility = match services.facility_service.get_facility(facility_id).await {
        Ok(facility) => facility,
        Err(e) => {
            warn!(facility_id = facility_id, error = %e, "Facility view for missing facility");
            bot.send_message(chat_id, "This facility no longer exists.").await?;
            return Ok(());
        }
    };

    let owner_name = match services.user_service.get_user_by_id(facility.owner_id).await? {
        Some(owner) => owner.display_name(),
        None => format!("user {}", facility.owner_id),
    };

    let text = format!(
        "🏛 {}\n\n{}\n\nOwner: {}",
        facility.name,
        facility.description.as_deref().unwrap_or("No description"),
        owner_name,
    );

    let mut keyboard_rows = vec![vec![InlineKeyboardButton::callback(
        "📅 Events here",
        format!("facility:events:{}", facility.id),
    )]];

    let can_manage = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => services.auth_service.can_manage_facility(&auth, &facility),
        Err(_) => false,
    };
    if can_manage {
        keyboard_rows.push(vec![
            InlineKeyboardButton::callback("✏️ Edit", format!("facility:edit:{}", facility.id)),
            InlineKeyboardButton::callback("🗑 Delete", format!("facility:delete:{}", facility.id)),
        ]);
    }

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// List events hosted at a facility
pub async fn handle_facility_events_callback(
    bot: Bot,
    chat_id: ChatId,
    facility_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let events = match services.event_service.list_by_facility(facility_id).await {
        Ok(events) => events,
        Err(e) => {
            error!(facility_id = facility_id, error = %e, "Failed to fetch facility events");
            bot.send_message(chat_id, "Could not load events. Please try again.").await?;
            return Ok(());
        }
    };

    if events.is_empty() {
        bot.send_message(chat_id, "No events at this facility yet.").await?;
        return Ok(());
    }

    let keyboard_rows: Vec<Vec<InlineKeyboardButton>> = events
        .iter()
        .map(|event| {
            vec![InlineKeyboardButton::callback(
                truncate_text(&event.name, 40),
                format!("event:view:{}", event.id),
            )]
        })
        .collect();

    bot.send_message(chat_id, "📅 Events at this facility:")
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Delete button: always confirm first
pub async fn handle_facility_delete_callback(
    bot: Bot,
    chat_id: ChatId,
    facility_id: i64,
) -> Result<()> {
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Yes, delete", format!("facility:delete_confirm:{}", facility_id)),
        InlineKeyboardButton::callback("No, keep it", format!("facility:view:{}", facility_id)),
    ]]);

    bot.send_message(chat_id, "Delete this facility? Its events keep running but lose the venue link.")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Confirmed facility deletion
pub async fn handle_facility_delete_confirm_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    facility_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let auth = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => auth,
        Err(GatherlyError::UserNotFound { .. }) => {
            bot.send_message(chat_id, "No profile yet. Send /start first.").await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    match services.facility_service.delete_facility(&auth, facility_id).await {
        Ok(()) => {
            bot.send_message(chat_id, "Facility deleted.").await?;
        }
        Err(GatherlyError::PermissionDenied(_)) => {
            bot.send_message(chat_id, "Only the owner can delete this facility.").await?;
        }
        Err(GatherlyError::FacilityNotFound { .. }) => {
            bot.send_message(chat_id, "This facility no longer exists.").await?;
        }
        Err(e) => {
            error!(facility_id = facility_id, error = %e, "Facility deletion failed");
            bot.send_message(chat_id, "Error deleting facility").await?;
        }
    }

    Ok(())
}

/// Apply one step of the facility creation/edit flow
pub async fn handle_facility_creation_input(
    bot: Bot,
    msg: Message,
    mut context: ConversationContext,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let telegram_id = context.user_id;
    let text = msg.text().unwrap_or("").trim().to_string();
    let step = context.step.clone().unwrap_or_default();

    if let Err(e) = scenario_manager.validate_input(&context, &text) {
        bot.send_message(msg.chat.id, e.to_string()).await?;
        return Ok(());
    }

    match step.as_str() {
        "name_input" => {
            context.set_data("name", text)?;
            scenario_manager.next_step(&mut context, "description_input")?;
            state_storage.save_context(&context).await?;

            let next = scenario_manager.get_current_step(&context)?;
            bot.send_message(msg.chat.id, next.prompt.clone()).await?;
        }
        "description_input" => {
            let name = context.get_string("name").unwrap_or_default();
            let description = Some(text);
            let edit_facility_id = context.get_i64("edit_facility_id");

            context.complete_scenario();
            state_storage.delete_context(telegram_id).await?;

            let auth = services.auth_service.get_auth_context(telegram_id).await?;

            match edit_facility_id {
                Some(facility_id) => {
                    let request = UpdateFacilityRequest {
                        name: Some(name),
                        description,
                    };
                    match services.facility_service.update_facility(&auth, facility_id, request).await {
                        Ok(facility) => {
                            bot.send_message(msg.chat.id, format!("{} updated.", facility.name)).await?;
                        }
                        Err(e) => {
                            error!(facility_id = facility_id, error = %e, "Facility update failed");
                            bot.send_message(msg.chat.id, "Error updating facility").await?;
                        }
                    }
                }
                None => {
                    match services.facility_service.create_facility(auth.user_id, name, description).await {
                        Ok(facility) => {
                            info!(facility_id = facility.id, user_id = auth.user_id, "Facility registered");
                            bot.send_message(msg.chat.id, format!("🏛 {} registered.", facility.name)).await?;

                            // Let opted-in admins know a new venue appeared
                            let mut params = HashMap::new();
                            params.insert("facility_name".to_string(), facility.name.clone());
                            match services.user_service.admins_to_notify().await {
                                Ok(recipients) => {
                                    let _ = services.notification_service
                                        .broadcast(&recipients, "admin.facility_created", &params, |u| u.admin_notifications)
                                        .await;
                                }
                                Err(e) => warn!(error = %e, "Could not load admin broadcast list"),
                            }
                        }
                        Err(e) => {
                            error!(user_id = auth.user_id, error = %e, "Facility creation failed");
                            bot.send_message(msg.chat.id, "Error adding facility").await?;
                        }
                    }
                }
            }
        }
        other => {
            return Err(GatherlyError::InvalidInput(format!("Unexpected facility step: {}", other)));
        }
    }

    Ok(())
}
