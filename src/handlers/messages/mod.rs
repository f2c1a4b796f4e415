//! Message handlers module
//!
//! Routes free-form messages into the active conversation flow: text input
//! for onboarding and creation scenarios, photo input for poster uploads.

use teloxide::{Bot, types::Message, prelude::*};
use tracing::{debug, warn};
use crate::utils::errors::{GatherlyError, Result};
use crate::services::ServiceFactory;
use crate::state::{ConversationContext, ScenarioManager, StateStorage};
use crate::handlers::commands::{start, events, facilities};

/// Handle incoming non-command messages
pub async fn handle_message(
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
    let chat_id = msg.chat.id;

    // Conversation flows only run in private chats
    if !chat_id.is_user() {
        return Ok(());
    }

    if let Some(context) = state_storage.load_context(telegram_id).await? {
        if context.scenario.is_some() {
            return handle_conversation_message(
                bot, msg, context, services, scenario_manager, state_storage,
            ).await;
        }
    }

    handle_regular_message(bot, msg).await
}

/// Route a message into the user's active scenario
async fn handle_conversation_message(
    bot: Bot,
    msg: Message,
    context: ConversationContext,
    services: ServiceFactory,
    scenario_manager: ScenarioManager,
    state_storage: StateStorage,
) -> Result<()> {
    let scenario = context.scenario.as_deref().unwrap_or("");
    let step = context.step.as_deref().unwrap_or("");

    debug!(user_id = context.user_id, scenario = scenario, step = step, "Handling conversation message");

    match scenario {
        "onboarding" => {
            start::handle_onboarding_input(bot, msg, context, services, scenario_manager, state_storage).await
        }
        "profile_edit" => {
            start::handle_profile_edit_input(bot, msg, context, services, scenario_manager, state_storage).await
        }
        "event_creation" => {
            events::handle_event_creation_input(bot, msg, context, services, scenario_manager, state_storage).await
        }
        "facility_creation" => {
            facilities::handle_facility_creation_input(bot, msg, context, services, scenario_manager, state_storage).await
        }
        "poster_upload" => {
            events::handle_poster_photo(bot, msg, context, services, state_storage).await
        }
        other => {
            warn!(scenario = %other, user_id = context.user_id, "Message for unknown scenario, clearing context");
            state_storage.delete_context(context.user_id).await?;
            Ok(())
        }
    }
}

/// Messages outside any flow get a gentle nudge towards the commands
async fn handle_regular_message(bot: Bot, msg: Message) -> Result<()> {
    if msg.text().is_some() {
        bot.send_message(
            msg.chat.id,
            "Try /events to browse events, or /help for everything I can do.",
        )
        .await?;
    }

    Ok(())
}
