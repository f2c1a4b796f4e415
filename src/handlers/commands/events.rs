//! Event command handlers
//!
//! The browse screen, the "my events" screen, the event landing page with
//! its join/leave controls, organizer partition management, the entrant
//! draw, and the event creation flow.

use std::collections::HashMap;
use chrono::{NaiveDate, TimeZone, Utc};
use teloxide::{Bot, types::{ChatId, Message, InlineKeyboardMarkup, InlineKeyboardButton}, prelude::*};
use tracing::{info, debug, warn, error};
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::{format_countdown, format_price, format_timestamp, parse_price, truncate_text};
use crate::utils::logging::log_event_action;
use crate::models::{CreateEventRequest, EntrantStatus, Event, UpdateEventRequest};
use crate::services::{ServiceFactory, StorageService, Role};
use crate::state::{ConversationContext, ScenarioManager, StateStorage};

const EVENTS_PAGE_SIZE: i64 = 25;

/// Handle /events command: list all available events
pub async fn handle_events_list(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let chat_id = msg.chat.id;
    debug!(chat_id = ?chat_id, "Processing /events command");

    render_events_list(&bot, chat_id, &services).await
}

/// Render the full browse list, replacing whatever was shown before
pub async fn render_events_list(bot: &Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let events = match services.event_service.list_available(EVENTS_PAGE_SIZE, 0).await {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, "Failed to fetch available events");
            bot.send_message(chat_id, "Could not load events. Please try again.").await?;
            return Ok(());
        }
    };

    if events.is_empty() {
        bot.send_message(chat_id, "No upcoming events right now. Check back later!").await?;
        return Ok(());
    }

    let mut keyboard_rows = Vec::with_capacity(events.len());
    for event in &events {
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            format_event_row(event),
            format!("event:view:{}", event.id),
        )]);
    }

    bot.send_message(chat_id, format!("🎟 Available events ({}):", events.len()))
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Handle /myevents command: events the user created or entered
pub async fn handle_my_events(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let telegram_id = user.id.0 as i64;

    let context = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(context) => context,
        Err(GatherlyError::UserNotFound { .. }) => {
            bot.send_message(msg.chat.id, "No profile yet. Send /start first.").await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let events = match services.event_service.list_related(context.user_id).await {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, user_id = context.user_id, "Failed to fetch related events");
            bot.send_message(msg.chat.id, "Could not load your events. Please try again.").await?;
            return Ok(());
        }
    };

    if events.is_empty() {
        bot.send_message(msg.chat.id, "You have no events yet. Try /events to find one.").await?;
        return Ok(());
    }

    let mut keyboard_rows = Vec::with_capacity(events.len());
    for event in &events {
        let marker = match services.event_service.entrant_status(event.id, context.user_id).await? {
            Some(status) => status.label().to_string(),
            None if event.created_by == context.user_id => "Organizing".to_string(),
            None => "—".to_string(),
        };
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            format!("{} · {}", truncate_text(&event.name, 40), marker),
            format!("event:view:{}", event.id),
        )]);
    }

    bot.send_message(msg.chat.id, "📋 Your events:")
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Handle /newevent command: organizers start the event creation flow
pub async fn handle_new_event(
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

    if let Err(e) = services.auth_service.require_role(telegram_id, Role::Organizer).await {
        debug!(telegram_id = telegram_id, error = %e, "newevent denied");
        bot.send_message(msg.chat.id, "Only organizers can create events.").await?;
        return Ok(());
    }

    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "event_creation")?;
    state_storage.save_context(&context).await?;

    let step = scenario_manager.get_current_step(&context)?;
    bot.send_message(msg.chat.id, format!("Let's publish a new event.\n\n{}", step.prompt)).await?;

    Ok(())
}

/// Event landing page: details, countdown, price and the join/leave control
pub async fn handle_event_view_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let event = match services.event_service.get_event(event_id).await {
        Ok(event) => event,
        Err(e) => {
            warn!(event_id = event_id, error = %e, "Event page requested for missing event");
            bot.send_message(chat_id, "This event no longer exists.").await?;
            return Ok(());
        }
    };

    let auth = services.auth_service.get_auth_context(telegram_id).await.ok();
    let user_id = auth.as_ref().map(|a| a.user_id);

    let entrant_status = match user_id {
        Some(user_id) => services.event_service.entrant_status(event.id, user_id).await?,
        None => None,
    };

    let mut text = format!("🎟 {}\n\n{}", event.name, event.description.as_deref().unwrap_or("No details"));
    text.push_str(&format!(
        "\n\n📋 Rules: {}",
        event.rules.as_deref().unwrap_or("No rules provided")
    ));
    text.push_str(&format!("\n🗓 Register by: {}", event.deadline.format("%Y-%m-%d")));
    text.push_str(&format!("\n⏳ {}", format_countdown(event.start_date, Utc::now())));
    text.push_str(&format!("\n💵 {}", format_price(event.ticket_price)));

    let waiting = services.event_service.waiting_count(event.id).await.unwrap_or(0);
    text.push_str(&format!("\n👥 Waiting list: {}/{}", waiting, event.capacity));

    if event.geolocation_required && services.event_service.geolocation_warnings_enabled() {
        text.push_str("\n⚠️ This event requires sharing your location.");
    }

    if let Some(key) = &event.poster_key {
        let poster_url = services.storage_service.download_url_or_placeholder(key).await;
        text.push_str(&format!("\n🖼 {}", poster_url));
    }

    if let Some(status) = entrant_status {
        text.push_str(&format!("\n\nYour status: {}", status.label()));
    }

    let mut keyboard_rows = Vec::new();
    match entrant_status {
        None => {
            keyboard_rows.push(vec![InlineKeyboardButton::callback(
                "✅ Join waiting list",
                format!("event:join:{}", event.id),
            )]);
        }
        Some(_) => {
            keyboard_rows.push(vec![InlineKeyboardButton::callback(
                "🚪 Leave event",
                format!("event:leave:{}", event.id),
            )]);
        }
    }

    let can_manage = auth
        .as_ref()
        .map(|a| services.auth_service.can_manage_event(a, &event))
        .unwrap_or(false);
    if can_manage {
        keyboard_rows.push(vec![
            InlineKeyboardButton::callback("👥 Entrants", format!("event:entrants:{}", event.id)),
            InlineKeyboardButton::callback("🎲 Run draw", format!("event:draw:{}", event.id)),
        ]);
        if services.event_service.poster_management_enabled() {
            keyboard_rows.push(vec![InlineKeyboardButton::callback(
                "🖼 Edit poster",
                format!("event:poster:{}", event.id),
            )]);
        }
    }

    if auth.as_ref().map(|a| a.is_admin()).unwrap_or(false) {
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            "🗑 Delete event",
            format!("event:delete:{}", event.id),
        )]);
    }

    keyboard_rows.push(vec![InlineKeyboardButton::callback("« Back to events", "event:back")]);

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Join button: capacity-checked append to the waiting list
pub async fn handle_join_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
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

    match services.event_service.join_event(event_id, auth.user_id).await {
        Ok(_) => {
            log_event_action(event_id, "join", auth.user_id, None);
            let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "🚪 Leave event",
                format!("event:leave:{}", event_id),
            )]]);
            bot.send_message(chat_id, "Successfully joined the event!")
                .reply_markup(keyboard)
                .await?;
        }
        Err(GatherlyError::EventFull { .. }) => {
            bot.send_message(chat_id, "Waiting list is full. Try again later.").await?;
        }
        Err(GatherlyError::AlreadyEntered { .. }) => {
            bot.send_message(chat_id, "You already entered this event.").await?;
        }
        Err(GatherlyError::EventNotFound { .. }) => {
            bot.send_message(chat_id, "This event no longer exists.").await?;
        }
        Err(e) => {
            error!(event_id = event_id, user_id = auth.user_id, error = %e, "Join failed");
            bot.send_message(chat_id, format!("Failed to join event: {}", e)).await?;
        }
    }

    Ok(())
}

/// Leave button: always confirm before removing the entrant
pub async fn handle_leave_callback(
    bot: Bot,
    chat_id: ChatId,
    event_id: i64,
) -> Result<()> {
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Yes, leave", format!("event:leave_confirm:{}", event_id)),
        InlineKeyboardButton::callback("No, stay", format!("event:view:{}", event_id)),
    ]]);

    bot.send_message(chat_id, "Are you sure you want to leave this event?")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Confirmed leave
pub async fn handle_leave_confirm_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
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

    match services.event_service.leave_event(event_id, auth.user_id).await {
        Ok(()) => {
            log_event_action(event_id, "leave", auth.user_id, None);
            bot.send_message(chat_id, "Successfully left the event").await?;
        }
        Err(GatherlyError::NotEntered { .. }) => {
            bot.send_message(chat_id, "You are not entered in this event.").await?;
        }
        Err(e) => {
            error!(event_id = event_id, user_id = auth.user_id, error = %e, "Leave failed");
            bot.send_message(chat_id, format!("Failed to leave event: {}", e)).await?;
        }
    }

    Ok(())
}

/// Organizer view of the five entrant partitions
pub async fn handle_entrants_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let (event, _auth) = match manageable_event(&services, telegram_id, event_id).await? {
        Some(pair) => pair,
        None => {
            bot.send_message(chat_id, "Only the organizer can see entrant lists.").await?;
            return Ok(());
        }
    };

    let lists = match services.event_service.entrant_lists(event_id).await {
        Ok(lists) => lists,
        Err(e) => {
            error!(event_id = event_id, error = %e, "Failed to load entrant lists");
            bot.send_message(chat_id, "Could not load entrant lists. Please try again.").await?;
            return Ok(());
        }
    };

    let mut text = format!("👥 Entrants for {}\n", event.name);
    for (label, entrants) in [
        (EntrantStatus::Waiting.label(), &lists.waiting),
        (EntrantStatus::Attending.label(), &lists.attending),
        (EntrantStatus::Unlucky.label(), &lists.unlucky),
        (EntrantStatus::Declined.label(), &lists.declined),
        (EntrantStatus::Removed.label(), &lists.removed),
    ] {
        text.push_str(&format!("\n{} ({})", label, entrants.len()));
        for entrant in entrants.iter().take(10) {
            let name = match services.user_service.get_user_by_id(entrant.user_id).await? {
                Some(user) => user.display_name(),
                None => format!("user {}", entrant.user_id),
            };
            text.push_str(&format!("\n  • {} (joined {})", name, format_timestamp(entrant.joined_at)));
        }
        if entrants.len() > 10 {
            text.push_str(&format!("\n  … and {} more", entrants.len() - 10));
        }
    }

    // Per-entrant moderation buttons for the first few waiting/attending rows
    let mut keyboard_rows = Vec::new();
    for entrant in lists.waiting.iter().take(5) {
        keyboard_rows.push(vec![
            InlineKeyboardButton::callback(
                format!("✅ Select {}", entrant.user_id),
                format!("event:promote:{}:{}", event.id, entrant.user_id),
            ),
            InlineKeyboardButton::callback(
                format!("🚫 Remove {}", entrant.user_id),
                format!("event:remove:{}:{}", event.id, entrant.user_id),
            ),
        ]);
    }
    for entrant in lists.attending.iter().take(5) {
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            format!("❌ Decline {}", entrant.user_id),
            format!("event:decline:{}:{}", event.id, entrant.user_id),
        )]);
    }

    let mut request = bot.send_message(chat_id, text);
    if !keyboard_rows.is_empty() {
        request = request.reply_markup(InlineKeyboardMarkup::new(keyboard_rows));
    }
    request.await?;

    Ok(())
}

/// Organizer moves one entrant between partitions
pub async fn handle_entrant_move_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    entrant_user_id: i64,
    to: EntrantStatus,
    services: ServiceFactory,
) -> Result<()> {
    let (event, _auth) = match manageable_event(&services, telegram_id, event_id).await? {
        Some(pair) => pair,
        None => {
            bot.send_message(chat_id, "Only the organizer can manage entrants.").await?;
            return Ok(());
        }
    };

    match services.event_service.move_entrant(event_id, entrant_user_id, to).await {
        Ok(entrant) => {
            if let Some(user) = services.user_service.get_user_by_id(entrant.user_id).await? {
                if let Err(e) = services.notification_service.notify_status_change(&user, &event, to).await {
                    warn!(user_id = entrant.user_id, error = %e, "Status change notification failed");
                }
            }
            bot.send_message(chat_id, format!("Moved to {}.", to.label())).await?;
        }
        Err(GatherlyError::NotEntered { .. }) => {
            bot.send_message(chat_id, "That user is no longer an entrant.").await?;
        }
        Err(GatherlyError::InvalidStateTransition { from, to }) => {
            bot.send_message(chat_id, format!("Cannot move an entrant from {} to {}.", from, to)).await?;
        }
        Err(e) => {
            error!(event_id = event_id, error = %e, "Entrant move failed");
            bot.send_message(chat_id, "Could not move the entrant. Please try again.").await?;
        }
    }

    Ok(())
}

/// Admin moderation: delete button, confirmation first
pub async fn handle_event_delete_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    if services.auth_service.require_role(telegram_id, Role::Admin).await.is_err() {
        bot.send_message(chat_id, "Only admins can delete events.").await?;
        return Ok(());
    }

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Yes, delete", format!("event:delete_confirm:{}", event_id)),
        InlineKeyboardButton::callback("No, keep it", format!("event:view:{}", event_id)),
    ]]);

    bot.send_message(chat_id, "Delete this event and all its entrant lists?")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Confirmed admin event deletion
pub async fn handle_event_delete_confirm_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    if services.auth_service.require_role(telegram_id, Role::Admin).await.is_err() {
        bot.send_message(chat_id, "Only admins can delete events.").await?;
        return Ok(());
    }

    match services.event_service.delete_event(event_id).await {
        Ok(()) => {
            info!(event_id = event_id, admin = telegram_id, "Event deleted by admin");
            bot.send_message(chat_id, "Event deleted.").await?;
        }
        Err(e) => {
            error!(event_id = event_id, error = %e, "Event deletion failed");
            bot.send_message(chat_id, "Could not delete the event. Please try again.").await?;
        }
    }

    Ok(())
}

/// Organizer draw: promote a random subset of the waiting list
pub async fn handle_draw_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
) -> Result<()> {
    let (event, _auth) = match manageable_event(&services, telegram_id, event_id).await? {
        Some(pair) => pair,
        None => {
            bot.send_message(chat_id, "Only the organizer can run the draw.").await?;
            return Ok(());
        }
    };

    let result = match services.event_service.draw_entrants(event_id, event.capacity as usize).await {
        Ok(result) => result,
        Err(e) => {
            error!(event_id = event_id, error = %e, "Draw failed");
            bot.send_message(chat_id, "The draw failed. Please try again.").await?;
            return Ok(());
        }
    };

    // Tell every affected entrant which side of the draw they landed on
    for (entrants, status) in [
        (&result.selected, EntrantStatus::Attending),
        (&result.unlucky, EntrantStatus::Unlucky),
    ] {
        for entrant in entrants.iter() {
            if let Some(user) = services.user_service.get_user_by_id(entrant.user_id).await? {
                if let Err(e) = services.notification_service.notify_status_change(&user, &event, status).await {
                    warn!(user_id = entrant.user_id, error = %e, "Draw notification failed");
                }
            }
        }
    }

    bot.send_message(
        chat_id,
        format!(
            "Draw complete: {} selected, {} unlucky.",
            result.selected.len(),
            result.unlucky.len()
        ),
    )
    .await?;

    Ok(())
}

/// Edit-poster button: start the poster upload flow for an event
pub async fn handle_poster_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    event_id: i64,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    if manageable_event(&services, telegram_id, event_id).await?.is_none() {
        bot.send_message(chat_id, "Only the organizer can change the poster.").await?;
        return Ok(());
    }

    let mut context = ConversationContext::new(telegram_id);
    scenario_manager.start_scenario(&mut context, "poster_upload")?;
    context.set_data("event_id", event_id)?;
    state_storage.save_context(&context).await?;

    let step = scenario_manager.get_current_step(&context)?;
    bot.send_message(chat_id, step.prompt.clone()).await?;

    Ok(())
}

/// Store an uploaded photo: either an event poster or a profile image,
/// depending on what the upload flow was started for
pub async fn handle_poster_photo(
    bot: Bot,
    msg: Message,
    context: ConversationContext,
    services: ServiceFactory,
    state_storage: StateStorage,
) -> Result<()> {
    let telegram_id = context.user_id;

    let Some(photos) = msg.photo() else {
        bot.send_message(msg.chat.id, "Please send an image.").await?;
        return Ok(());
    };

    // The largest size is last
    let Some(photo) = photos.last() else {
        bot.send_message(msg.chat.id, "Please send an image.").await?;
        return Ok(());
    };

    let Some(event_id) = context.get_i64("event_id") else {
        let file_id = photo.file.id.clone();
        return handle_profile_photo(bot, msg, telegram_id, &file_id, services, state_storage).await;
    };

    let event = match services.event_service.get_event(event_id).await {
        Ok(event) => event,
        Err(e) => {
            state_storage.delete_context(telegram_id).await?;
            warn!(event_id = event_id, error = %e, "Poster upload for missing event");
            bot.send_message(msg.chat.id, "This event no longer exists.").await?;
            return Ok(());
        }
    };

    let bytes = match download_photo(&bot, &photo.file.id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(event_id = event_id, error = %e, "Poster download failed");
            bot.send_message(msg.chat.id, "Could not read the photo. Please try again.").await?;
            return Ok(());
        }
    };

    let key = StorageService::poster_key(&event.name);
    match services.storage_service.upload(&key, bytes, "image/jpeg").await {
        Ok(_) => {
            let update = UpdateEventRequest {
                poster_key: Some(key),
                ..Default::default()
            };
            if let Err(e) = services.event_service.update_event(event_id, update).await {
                error!(event_id = event_id, error = %e, "Failed to record poster key");
                bot.send_message(msg.chat.id, "Upload worked but saving the event failed.").await?;
            } else {
                bot.send_message(msg.chat.id, "Poster updated successfully").await?;
                info!(event_id = event_id, telegram_id = telegram_id, "Poster updated");
            }
        }
        Err(e) => {
            error!(event_id = event_id, error = %e, "Poster upload failed");
            bot.send_message(
                msg.chat.id,
                "Failed to update poster. Please check your connection and try again.",
            )
            .await?;
        }
    }

    state_storage.delete_context(telegram_id).await?;
    Ok(())
}

/// Store an uploaded profile image and record it on the user
async fn handle_profile_photo(
    bot: Bot,
    msg: Message,
    telegram_id: i64,
    file_id: &str,
    services: ServiceFactory,
    state_storage: StateStorage,
) -> Result<()> {
    let auth = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => auth,
        Err(e) => {
            state_storage.delete_context(telegram_id).await?;
            return Err(e);
        }
    };

    let bytes = match download_photo(&bot, file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(telegram_id = telegram_id, error = %e, "Profile photo download failed");
            bot.send_message(msg.chat.id, "Could not read the photo. Please try again.").await?;
            return Ok(());
        }
    };

    let key = StorageService::profile_image_key(auth.user_id);
    match services.storage_service.upload(&key, bytes, "image/jpeg").await {
        Ok(_) => {
            if let Err(e) = services.user_service.set_profile_image(telegram_id, key).await {
                error!(telegram_id = telegram_id, error = %e, "Failed to record profile image");
                bot.send_message(msg.chat.id, "Upload worked but saving your profile failed.").await?;
            } else {
                bot.send_message(msg.chat.id, "Profile photo updated.").await?;
                info!(telegram_id = telegram_id, "Profile photo updated");
            }
        }
        Err(e) => {
            error!(telegram_id = telegram_id, error = %e, "Profile photo upload failed");
            bot.send_message(
                msg.chat.id,
                "Failed to update your photo. Please check your connection and try again.",
            )
            .await?;
        }
    }

    state_storage.delete_context(telegram_id).await?;
    Ok(())
}

/// Apply one step of the event creation flow with the user's text input
pub async fn handle_event_creation_input(
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
        "name_input" => {
            context.set_data("name", text)?;
            scenario_manager.next_step(&mut context, "description_input")?;
        }
        "description_input" => {
            context.set_data("description", text)?;
            scenario_manager.next_step(&mut context, "rules_input")?;
        }
        "rules_input" => {
            if !skipping {
                context.set_data("rules", text)?;
            }
            scenario_manager.next_step(&mut context, "deadline_input")?;
        }
        "deadline_input" => {
            context.set_data("deadline", text)?;
            scenario_manager.next_step(&mut context, "start_date_input")?;
        }
        "start_date_input" => {
            context.set_data("start_date", text)?;
            scenario_manager.next_step(&mut context, "price_input")?;
        }
        "price_input" => {
            let Some(price) = parse_price(&text) else {
                bot.send_message(msg.chat.id, "Please enter a price like 0, 12 or 12.50").await?;
                return Ok(());
            };
            context.set_data("ticket_price", price)?;
            scenario_manager.next_step(&mut context, "capacity_input")?;
        }
        "capacity_input" => {
            let Ok(capacity) = text.parse::<i32>() else {
                bot.send_message(msg.chat.id, "Please enter a whole number").await?;
                return Ok(());
            };
            if capacity <= 0 {
                bot.send_message(msg.chat.id, "Capacity must be greater than 0").await?;
                return Ok(());
            }
            context.set_data("capacity", capacity)?;
            scenario_manager.next_step(&mut context, "facility_input")?;
        }
        "facility_input" => {
            if !skipping {
                let Ok(facility_id) = text.parse::<i64>() else {
                    bot.send_message(msg.chat.id, "Please enter a facility number from /facilities").await?;
                    return Ok(());
                };
                if let Err(e) = services.facility_service.get_facility(facility_id).await {
                    debug!(facility_id = facility_id, error = %e, "Facility lookup failed");
                    bot.send_message(msg.chat.id, "No such facility. Check /facilities and try again.").await?;
                    return Ok(());
                }
                context.set_data("facility_id", facility_id)?;
            }
            scenario_manager.next_step(&mut context, "confirm")?;
            state_storage.save_context(&context).await?;

            let summary = event_creation_summary(&context)?;
            let keyboard = InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("✅ Create", "event_create:confirm"),
                InlineKeyboardButton::callback("❌ Discard", "event_create:cancel"),
            ]]);
            bot.send_message(msg.chat.id, summary).reply_markup(keyboard).await?;
            return Ok(());
        }
        other => {
            return Err(GatherlyError::InvalidInput(format!("Unexpected event creation step: {}", other)));
        }
    }

    state_storage.save_context(&context).await?;
    let next = scenario_manager.get_current_step(&context)?;
    bot.send_message(msg.chat.id, next.prompt.clone()).await?;

    Ok(())
}

/// Confirm button at the end of the event creation flow
pub async fn handle_event_create_confirm_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    confirmed: bool,
    services: ServiceFactory,
    state_storage: StateStorage,
) -> Result<()> {
    let Some(context) = state_storage.load_context(telegram_id).await? else {
        bot.send_message(chat_id, "This flow has expired. Start again with /newevent.").await?;
        return Ok(());
    };

    if !context.is_at("event_creation", "confirm") {
        bot.send_message(chat_id, "Nothing to confirm right now.").await?;
        return Ok(());
    }

    if !confirmed {
        state_storage.delete_context(telegram_id).await?;
        bot.send_message(chat_id, "Discarded.").await?;
        return Ok(());
    }

    context.validate_data(&["name", "description", "deadline", "start_date", "ticket_price", "capacity"])?;

    let auth = services.auth_service.get_auth_context(telegram_id).await?;
    let request = CreateEventRequest {
        name: context.get_string("name").unwrap_or_default(),
        description: context.get_string("description"),
        rules: context.get_string("rules"),
        deadline: parse_day_end(&context.get_string("deadline").unwrap_or_default())?,
        start_date: parse_day_start(&context.get_string("start_date").unwrap_or_default())?,
        ticket_price: context.get_i64("ticket_price").unwrap_or(0),
        capacity: context.get_i64("capacity").unwrap_or(0) as i32,
        facility_id: context.get_i64("facility_id"),
        geolocation_required: false,
        created_by: auth.user_id,
    };

    match services.event_service.create_event(request).await {
        Ok(event) => {
            state_storage.delete_context(telegram_id).await?;
            bot.send_message(chat_id, format!("🎉 {} is live! Entrants can now join.", event.name)).await?;

            // Fan out to organizers who opted into announcements
            let mut params = HashMap::new();
            params.insert("event_name".to_string(), event.name.clone());
            params.insert("deadline".to_string(), event.deadline.format("%Y-%m-%d").to_string());
            match services.user_service.organizers_to_notify().await {
                Ok(recipients) => {
                    let _ = services.notification_service
                        .broadcast(&recipients, "organizer.event_created", &params, |u| u.organizer_notifications)
                        .await;
                }
                Err(e) => warn!(error = %e, "Could not load organizer broadcast list"),
            }
        }
        Err(e) => {
            error!(telegram_id = telegram_id, error = %e, "Event creation failed");
            bot.send_message(chat_id, format!("Could not create the event: {}", e)).await?;
        }
    }

    Ok(())
}

/// Human-readable one-line list entry for the browse screen
fn format_event_row(event: &Event) -> String {
    format!(
        "{} · {} · {}",
        truncate_text(&event.name, 30),
        event.deadline.format("%b %d"),
        format_price(event.ticket_price)
    )
}

fn event_creation_summary(context: &ConversationContext) -> Result<String> {
    context.validate_data(&["name", "description", "deadline", "start_date", "ticket_price", "capacity"])?;

    let mut summary = format!(
        "Create this event?\n\n🎟 {}\n{}\n",
        context.get_string("name").unwrap_or_default(),
        context.get_string("description").unwrap_or_default(),
    );
    if let Some(rules) = context.get_string("rules") {
        summary.push_str(&format!("📋 {}\n", rules));
    }
    summary.push_str(&format!(
        "🗓 Register by {} · starts {}\n💵 {} · capacity {}",
        context.get_string("deadline").unwrap_or_default(),
        context.get_string("start_date").unwrap_or_default(),
        format_price(context.get_i64("ticket_price").unwrap_or(0)),
        context.get_i64("capacity").unwrap_or(0),
    ));

    Ok(summary)
}

/// Registration closes at the end of the chosen day
fn parse_day_end(input: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| GatherlyError::InvalidInput(format!("Invalid date: {}", input)))?;
    let naive = date.and_hms_opt(23, 59, 59)
        .ok_or_else(|| GatherlyError::InvalidInput(format!("Invalid date: {}", input)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn parse_day_start(input: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| GatherlyError::InvalidInput(format!("Invalid date: {}", input)))?;
    let naive = date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| GatherlyError::InvalidInput(format!("Invalid date: {}", input)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Load an event and check the caller may manage it
async fn manageable_event(
    services: &ServiceFactory,
    telegram_id: i64,
    event_id: i64,
) -> Result<Option<(Event, crate::services::AuthContext)>> {
    let auth = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => auth,
        Err(GatherlyError::UserNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };

    let event = match services.event_service.get_event(event_id).await {
        Ok(event) => event,
        Err(GatherlyError::EventNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };

    if services.auth_service.can_manage_event(&auth, &event) {
        Ok(Some((event, auth)))
    } else {
        Ok(None)
    }
}

/// Fetch a Telegram photo's bytes
async fn download_photo(bot: &Bot, file_id: &str) -> Result<Vec<u8>> {
    use teloxide::net::Download;
    use futures::StreamExt;

    let file = bot.get_file(file_id.to_string()).await?;
    let mut stream = bot.download_file_stream(&file.path);

    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            GatherlyError::ServiceUnavailable(format!("photo download failed: {}", e))
        })?;
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_day_bounds() {
        let end = parse_day_end("2024-08-01").unwrap();
        assert_eq!(end.day(), 1);
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");

        let start = parse_day_start("2024-08-01").unwrap();
        assert_eq!(start.format("%H:%M:%S").to_string(), "00:00:00");
        assert!(start < end);

        assert!(parse_day_end("tomorrow").is_err());
    }

    #[test]
    fn test_format_event_row() {
        let event = Event {
            id: 1,
            name: "Summer Dance".to_string(),
            description: None,
            rules: None,
            deadline: Utc.with_ymd_and_hms(2024, 8, 1, 23, 59, 59).unwrap(),
            start_date: Utc.with_ymd_and_hms(2024, 8, 15, 0, 0, 0).unwrap(),
            ticket_price: 1250,
            capacity: 20,
            facility_id: None,
            poster_key: None,
            geolocation_required: false,
            created_by: 1,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let row = format_event_row(&event);
        assert!(row.contains("Summer Dance"));
        assert!(row.contains("Aug 01"));
        assert!(row.contains("$12.50"));
    }
}
