//! Start command handler
//!
//! Handles first contact, profile onboarding, the profile screen, and
//! profile editing flows.

use teloxide::{Bot, types::{ChatId, Message, InlineKeyboardMarkup, InlineKeyboardButton}, prelude::*};
use tracing::{info, debug, error};
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::logging::log_user_action;
use crate::models::UpdateUserRequest;
use crate::services::ServiceFactory;
use crate::state::{ConversationContext, ScenarioManager, StateStorage};

/// Handle /start command: register the user on first contact and run
/// profile onboarding when details are missing
pub async fn handle_start(
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
    debug!(telegram_id = telegram_id, "Processing /start command");

    let db_user = services.user_service
        .register_or_get_user(
            telegram_id,
            user.username.clone(),
            Some(user.first_name.clone()),
            user.last_name.clone(),
        )
        .await?;

    if db_user.profile_complete() {
        bot.send_message(
            msg.chat.id,
            format!(
                "Welcome back, {}! Use /events to browse what's on.",
                db_user.display_name()
            ),
        )
        .await?;
        return Ok(());
    }

    // First contact: collect name and contact details
    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "onboarding")?;
    state_storage.save_context(&context).await?;

    let step = scenario_manager.get_current_step(&context)?;
    bot.send_message(
        msg.chat.id,
        format!("Welcome to Gatherly! Let's set up your profile.\n\n{}", step.prompt),
    )
    .await?;

    info!(telegram_id = telegram_id, "Onboarding started");
    Ok(())
}

/// Handle /profile command: render the profile screen with edit controls
pub async fn handle_profile(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;

    let telegram_id = user.id.0 as i64;

    let Some(db_user) = services.user_service.get_user_by_telegram_id(telegram_id).await? else {
        bot.send_message(msg.chat.id, "No profile yet. Send /start first.").await?;
        return Ok(());
    };

    let mut lines = vec![format!("👤 {}", db_user.display_name())];
    lines.push(format!("✉️ {}", db_user.email.as_deref().unwrap_or("no email")));
    lines.push(format!("📞 {}", db_user.phone.as_deref().unwrap_or("no phone")));
    if db_user.is_organizer {
        lines.push(format!(
            "🎪 Organizer (notifications {})",
            if db_user.organizer_notifications { "on" } else { "off" }
        ));
    }
    if db_user.is_admin {
        lines.push(format!(
            "🛡 Admin (notifications {})",
            if db_user.admin_notifications { "on" } else { "off" }
        ));
    }

    let profile_image = match &db_user.profile_image_key {
        Some(key) => services.storage_service.download_url_or_placeholder(key).await,
        None => String::new(),
    };
    if !profile_image.is_empty() {
        lines.push(format!("🖼 {}", profile_image));
    }

    let mut keyboard_rows = vec![vec![
        InlineKeyboardButton::callback("✏️ Edit profile", "profile:edit"),
        InlineKeyboardButton::callback("🖼 Update photo", "profile:photo"),
    ]];
    if db_user.is_organizer {
        let label = if db_user.organizer_notifications {
            "🔕 Mute organizer notifications"
        } else {
            "🔔 Enable organizer notifications"
        };
        keyboard_rows.push(vec![InlineKeyboardButton::callback(label, "profile:notif:organizer")]);
    }
    if db_user.is_admin {
        let label = if db_user.admin_notifications {
            "🔕 Mute admin notifications"
        } else {
            "🔔 Enable admin notifications"
        };
        keyboard_rows.push(vec![InlineKeyboardButton::callback(label, "profile:notif:admin")]);
    }

    bot.send_message(msg.chat.id, lines.join("\n"))
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Handle /cancel command: abandon the current flow if it allows it
pub async fn handle_cancel(
    bot: Bot,
    msg: Message,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;

    let telegram_id = user.id.0 as i64;

    match state_storage.load_context(telegram_id).await? {
        Some(mut context) => {
            let scenario = context.scenario.clone().unwrap_or_default();
            if !scenario_manager.can_interrupt(&scenario) {
                bot.send_message(msg.chat.id, "Please finish setting up your profile first.").await?;
                return Ok(());
            }

            context.cancel_scenario();
            state_storage.delete_context(telegram_id).await?;
            bot.send_message(msg.chat.id, "Cancelled.").await?;
            info!(telegram_id = telegram_id, scenario = %scenario, "Flow cancelled");
        }
        None => {
            bot.send_message(msg.chat.id, "Nothing to cancel.").await?;
        }
    }

    Ok(())
}

/// Profile edit button: start the field edit flow
pub async fn handle_profile_edit_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "profile_edit")?;
    state_storage.save_context(&context).await?;

    let step = scenario_manager.get_current_step(&context)?;
    bot.send_message(
        chat_id,
        format!("{}\n(first_name, last_name, email or phone)", step.prompt),
    )
    .await?;

    Ok(())
}

/// Update-photo button: start the photo upload flow without an event, the
/// photo handler then treats it as a profile image
pub async fn handle_profile_photo_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "poster_upload")?;
    state_storage.save_context(&context).await?;

    bot.send_message(chat_id, "Send your new profile photo.").await?;
    Ok(())
}

/// Notification preference toggle button
pub async fn handle_notification_toggle_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    kind: &str,
    services: ServiceFactory,
) -> Result<()> {
    let Some(db_user) = services.user_service.get_user_by_telegram_id(telegram_id).await? else {
        bot.send_message(chat_id, "No profile yet. Send /start first.").await?;
        return Ok(());
    };

    let result = match kind {
        "admin" => {
            services.user_service
                .set_notification_preferences(telegram_id, Some(!db_user.admin_notifications), None)
                .await
        }
        "organizer" => {
            services.user_service
                .set_notification_preferences(telegram_id, None, Some(!db_user.organizer_notifications))
                .await
        }
        _ => Err(GatherlyError::InvalidInput(format!("Unknown notification kind: {}", kind))),
    };

    match result {
        Ok(_) => {
            bot.send_message(chat_id, "Notification preference updated.").await?;
        }
        Err(e) => {
            error!(telegram_id = telegram_id, error = %e, "Failed to toggle notifications");
            bot.send_message(chat_id, "Failed to update notification preference.").await?;
        }
    }

    Ok(())
}

/// Apply one step of the onboarding flow with the user's text input
pub async fn handle_onboarding_input(
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
    let skipping = text == "/skip";

    if !skipping {
        if let Err(e) = scenario_manager.validate_input(&context, &text) {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    }

    match step.as_str() {
        "first_name_input" => {
            context.set_data("first_name", text)?;
            scenario_manager.next_step(&mut context, "last_name_input")?;
        }
        "last_name_input" => {
            context.set_data("last_name", text)?;
            scenario_manager.next_step(&mut context, "email_input")?;
        }
        "email_input" => {
            context.set_data("email", text)?;
            scenario_manager.next_step(&mut context, "phone_input")?;
        }
        "phone_input" => {
            if !skipping {
                context.set_data("phone", text)?;
            }

            let update = UpdateUserRequest {
                first_name: context.get_string("first_name"),
                last_name: context.get_string("last_name"),
                email: context.get_string("email"),
                phone: context.get_string("phone"),
                ..Default::default()
            };

            match services.user_service.update_user_profile(telegram_id, update).await {
                Ok(user) => {
                    context.complete_scenario();
                    state_storage.delete_context(telegram_id).await?;
                    bot.send_message(
                        msg.chat.id,
                        format!(
                            "Profile saved, {}. Use /events to browse what's on.",
                            user.display_name()
                        ),
                    )
                    .await?;
                    log_user_action(telegram_id, "onboarding_completed", None);
                    return Ok(());
                }
                Err(e) => {
                    error!(telegram_id = telegram_id, error = %e, "Failed to save profile");
                    bot.send_message(msg.chat.id, "Failed to save your profile. Please try again.").await?;
                    return Ok(());
                }
            }
        }
        other => {
            return Err(GatherlyError::InvalidInput(format!("Unexpected onboarding step: {}", other)));
        }
    }

    state_storage.save_context(&context).await?;
    let next = scenario_manager.get_current_step(&context)?;
    bot.send_message(msg.chat.id, next.prompt.clone()).await?;

    Ok(())
}

/// Apply one step of the profile edit flow
pub async fn handle_profile_edit_input(
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
        "field_choice" => {
            context.set_data("field", text)?;
            scenario_manager.next_step(&mut context, "value_input")?;
            state_storage.save_context(&context).await?;

            let next = scenario_manager.get_current_step(&context)?;
            bot.send_message(msg.chat.id, next.prompt.clone()).await?;
        }
        "value_input" => {
            let field = context.get_string("field").unwrap_or_default();
            let mut update = UpdateUserRequest::default();
            match field.as_str() {
                "first_name" => update.first_name = Some(text),
                "last_name" => update.last_name = Some(text),
                "email" => update.email = Some(text),
                "phone" => update.phone = Some(text),
                other => {
                    return Err(GatherlyError::InvalidInput(format!("Unknown profile field: {}", other)));
                }
            }

            match services.user_service.update_user_profile(telegram_id, update).await {
                Ok(_) => {
                    bot.send_message(msg.chat.id, format!("Updated {}.", field)).await?;
                }
                Err(e) => {
                    error!(telegram_id = telegram_id, error = %e, "Profile edit failed");
                    bot.send_message(msg.chat.id, format!("Could not update {}: {}", field, e)).await?;
                }
            }

            context.complete_scenario();
            state_storage.delete_context(telegram_id).await?;
        }
        other => {
            return Err(GatherlyError::InvalidInput(format!("Unexpected profile edit step: {}", other)));
        }
    }

    Ok(())
}
