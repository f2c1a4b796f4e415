//! Admin command handlers
//!
//! The admin panel: global facility view, stored poster browser with
//! moderation deletes, and system statistics.

use teloxide::{Bot, types::{ChatId, Message, InlineKeyboardMarkup, InlineKeyboardButton}, prelude::*};
use tracing::{info, debug, warn, error};
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::helpers::truncate_text;
use crate::utils::logging::log_admin_action;
use crate::services::{ServiceFactory, Role};
use crate::state::{ConversationContext, StateStorage};

/// Handle /admin command: entry point for the admin panel
pub async fn handle_admin_panel(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let telegram_id = user.id.0 as i64;

    if !services.auth_service.admin_panel_enabled() {
        bot.send_message(msg.chat.id, "The admin panel is disabled.").await?;
        return Ok(());
    }

    if !services.auth_service.is_bootstrap_admin(telegram_id) {
        if services.auth_service.require_role(telegram_id, Role::Admin).await.is_err() {
            debug!(telegram_id = telegram_id, "Admin panel denied");
            bot.send_message(msg.chat.id, "The admin panel is admins-only.").await?;
            return Ok(());
        }
    }

    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🏛 All facilities", "admin:facilities")],
        vec![InlineKeyboardButton::callback("🖼 Poster images", "admin:images")],
        vec![InlineKeyboardButton::callback("👤 Users", "admin:users")],
        vec![InlineKeyboardButton::callback("📊 Statistics", "admin:stats")],
    ]);

    bot.send_message(msg.chat.id, "🛡 Admin panel")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle /stats command: admin-only system statistics
pub async fn handle_stats(bot: Bot, msg: Message, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let telegram_id = user.id.0 as i64;

    if !services.auth_service.is_bootstrap_admin(telegram_id)
        && services.auth_service.require_role(telegram_id, Role::Admin).await.is_err()
    {
        bot.send_message(msg.chat.id, "Statistics are admins-only.").await?;
        return Ok(());
    }

    render_stats(&bot, msg.chat.id, telegram_id, &services).await
}

/// Admin panel callback dispatcher
pub async fn handle_admin_callback(
    bot: Bot,
    chat_id: ChatId,
    telegram_id: i64,
    action: String,
    services: ServiceFactory,
    state_storage: StateStorage,
) -> Result<()> {
    if !services.auth_service.is_bootstrap_admin(telegram_id)
        && services.auth_service.require_role(telegram_id, Role::Admin).await.is_err()
    {
        warn!(telegram_id = telegram_id, action = %action, "Unauthorized admin callback");
        bot.send_message(chat_id, "The admin panel is admins-only.").await?;
        return Ok(());
    }

    match action.as_str() {
        "facilities" => {
            render_all_facilities(&bot, chat_id, telegram_id, &services).await?;
        }
        "images" => {
            render_poster_browser(&bot, chat_id, telegram_id, &services, &state_storage).await?;
        }
        "users" => {
            render_users(&bot, chat_id, &services).await?;
        }
        "stats" => {
            render_stats(&bot, chat_id, telegram_id, &services).await?;
        }
        other if other.starts_with("delimg_") => {
            let index: usize = other
                .trim_start_matches("delimg_")
                .parse()
                .map_err(|_| GatherlyError::InvalidInput(format!("Bad image index: {}", other)))?;
            delete_poster_by_index(&bot, chat_id, telegram_id, index, &services, &state_storage).await?;
        }
        other => {
            warn!(action = %other, "Unknown admin action");
        }
    }

    Ok(())
}

/// Global facility listing (admin view)
async fn render_all_facilities(bot: &Bot, chat_id: ChatId, telegram_id: i64, services: &ServiceFactory) -> Result<()> {
    let auth = match services.auth_service.get_auth_context(telegram_id).await {
        Ok(auth) => auth,
        Err(e) => {
            error!(telegram_id = telegram_id, error = %e, "Admin context resolution failed");
            bot.send_message(chat_id, "Error loading facilities").await?;
            return Ok(());
        }
    };

    let facilities = match services.facility_service.list_for(&auth, 100, 0).await {
        Ok(facilities) => facilities,
        Err(e) => {
            error!(error = %e, "Failed to fetch all facilities");
            bot.send_message(chat_id, "Error loading facilities").await?;
            return Ok(());
        }
    };

    if facilities.is_empty() {
        bot.send_message(chat_id, "No facilities registered yet.").await?;
        return Ok(());
    }

    let keyboard_rows: Vec<Vec<InlineKeyboardButton>> = facilities
        .iter()
        .map(|facility| {
            vec![InlineKeyboardButton::callback(
                format!("#{} · {}", facility.id, truncate_text(&facility.name, 40)),
                format!("facility:view:{}", facility.id),
            )]
        })
        .collect();

    bot.send_message(chat_id, format!("🏛 All facilities ({}):", facilities.len()))
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Poster browser: list stored poster objects with delete buttons.
///
/// Keys can exceed Telegram's callback-data limit, so the listing is kept
/// in the admin's conversation context and buttons carry indexes.
async fn render_poster_browser(
    bot: &Bot,
    chat_id: ChatId,
    telegram_id: i64,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let keys: Vec<String> = match services.storage_service.list("event_posters/").await {
        Ok(objects) => objects.into_iter().map(|o| o.key).collect(),
        Err(e) => {
            // Store listing unavailable: fall back to the keys events reference
            warn!(error = %e, "Storage listing failed, falling back to event poster keys");
            match services.event_service.poster_keys().await {
                Ok(keys) => keys,
                Err(e) => {
                    error!(error = %e, "Poster key fallback failed");
                    bot.send_message(chat_id, "Could not list poster images.").await?;
                    return Ok(());
                }
            }
        }
    };

    if keys.is_empty() {
        bot.send_message(chat_id, "No poster images stored.").await?;
        return Ok(());
    }

    let mut context = state_storage
        .load_context(telegram_id)
        .await?
        .unwrap_or_else(|| ConversationContext::new(telegram_id));
    context.set_data("admin_poster_keys", keys.clone())?;
    state_storage.save_context(&context).await?;

    let mut keyboard_rows = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate().take(30) {
        keyboard_rows.push(vec![InlineKeyboardButton::callback(
            format!("🗑 {}", truncate_text(key, 50)),
            format!("admin:delimg_{}", index),
        )]);
    }

    bot.send_message(chat_id, format!("🖼 Stored posters ({}):", keys.len()))
        .reply_markup(InlineKeyboardMarkup::new(keyboard_rows))
        .await?;

    Ok(())
}

/// Delete a stored poster picked from the browser
async fn delete_poster_by_index(
    bot: &Bot,
    chat_id: ChatId,
    telegram_id: i64,
    index: usize,
    services: &ServiceFactory,
    state_storage: &StateStorage,
) -> Result<()> {
    let Some(context) = state_storage.load_context(telegram_id).await? else {
        bot.send_message(chat_id, "The poster list expired. Open it again.").await?;
        return Ok(());
    };

    let keys: Vec<String> = context.get_data("admin_poster_keys")?.unwrap_or_default();
    let Some(key) = keys.get(index) else {
        bot.send_message(chat_id, "That poster is no longer in the list.").await?;
        return Ok(());
    };

    match services.storage_service.delete(key).await {
        Ok(()) => {
            // Events pointing at the deleted object fall back to the placeholder
            if let Err(e) = services.event_service.detach_poster(key).await {
                warn!(key = %key, error = %e, "Could not clear poster references");
            }
            log_admin_action(telegram_id, "delete_poster", Some(key.as_str()), None);
            info!(key = %key, admin = telegram_id, "Poster deleted");
            bot.send_message(chat_id, "Image deleted successfully.").await?;
        }
        Err(e) => {
            error!(key = %key, error = %e, "Poster deletion failed");
            bot.send_message(chat_id, format!("Failed to delete image: {}", e)).await?;
        }
    }

    Ok(())
}

/// Recently registered users with their roles
async fn render_users(bot: &Bot, chat_id: ChatId, services: &ServiceFactory) -> Result<()> {
    let users = match services.user_service.list_users(20, 0).await {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "Failed to list users");
            bot.send_message(chat_id, "Could not load users.").await?;
            return Ok(());
        }
    };

    let mut text = format!("👤 Recent users ({}):\n", users.len());
    for user in &users {
        let role = if user.is_admin {
            "admin"
        } else if user.is_organizer {
            "organizer"
        } else {
            "user"
        };
        text.push_str(&format!("\n{} · {} · tg {}", user.display_name(), role, user.telegram_id));
    }
    text.push_str("\n\nUse /promote <telegram_id> <organizer|admin> to grant a role.");

    bot.send_message(chat_id, text).await?;
    Ok(())
}

/// Handle /promote command: grant the organizer or admin role
pub async fn handle_promote(bot: Bot, msg: Message, args: String, services: ServiceFactory) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        GatherlyError::InvalidInput("No user in message".to_string())
    })?;
    let admin_id = user.id.0 as i64;

    if !services.auth_service.is_bootstrap_admin(admin_id)
        && services.auth_service.require_role(admin_id, Role::Admin).await.is_err()
    {
        bot.send_message(msg.chat.id, "Only admins can grant roles.").await?;
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let (Some(target), Some(role)) = (parts.next(), parts.next()) else {
        bot.send_message(msg.chat.id, "Usage: /promote <telegram_id> <organizer|admin>").await?;
        return Ok(());
    };
    let Ok(target_id) = target.parse::<i64>() else {
        bot.send_message(msg.chat.id, "The first argument must be a Telegram id.").await?;
        return Ok(());
    };

    let result = match role {
        "organizer" => services.user_service.set_organizer_status(target_id, true, admin_id).await,
        "admin" => services.user_service.set_admin_status(target_id, true, admin_id).await,
        other => {
            bot.send_message(msg.chat.id, format!("Unknown role: {}", other)).await?;
            return Ok(());
        }
    };

    match result {
        Ok(user) => {
            let target_label = target_id.to_string();
            log_admin_action(admin_id, "promote", Some(target_label.as_str()), Some(role));
            bot.send_message(msg.chat.id, format!("{} is now an {}.", user.display_name(), role)).await?;
        }
        Err(GatherlyError::UserNotFound { .. }) => {
            bot.send_message(msg.chat.id, "No user with that Telegram id has talked to the bot yet.").await?;
        }
        Err(e) => {
            error!(target = target_id, error = %e, "Role grant failed");
            bot.send_message(msg.chat.id, "Could not grant the role. Please try again.").await?;
        }
    }

    Ok(())
}

/// Render system statistics
async fn render_stats(bot: &Bot, chat_id: ChatId, telegram_id: i64, services: &ServiceFactory) -> Result<()> {
    let stats = match services.database.get_system_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Failed to load statistics");
            bot.send_message(chat_id, "Could not load statistics.").await?;
            return Ok(());
        }
    };

    let user_stats = services.user_service.get_user_statistics().await.unwrap_or_default();
    let health = services.health_check().await;

    let mut text = String::from("📊 Gatherly statistics\n");
    text.push_str(&format!("Users: {}\n", stats["total_users"]));
    text.push_str(&format!("Events: {}\n", stats["total_events"]));
    text.push_str(&format!("Facilities: {}\n", stats["total_facilities"]));
    if let Some(organizers) = user_stats.get("organizers_with_notifications") {
        text.push_str(&format!("Organizers receiving broadcasts: {}\n", organizers));
    }
    text.push_str(&format!(
        "Redis: {}\n",
        if health.redis_healthy { "healthy" } else { "unreachable" }
    ));
    if !health.is_healthy() {
        text.push_str(&format!("Issues: {}\n", health.get_issues().join(", ")));
    }

    log_admin_action(telegram_id, "view_stats", None, None);
    bot.send_message(chat_id, text).await?;

    Ok(())
}
