//! Help command handler

use teloxide::{Bot, types::Message, prelude::*};
use crate::utils::errors::Result;

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message) -> Result<()> {
    let help_text = "\
🎟 Gatherly — event discovery and registration

/events — browse available events
/myevents — events you created or entered
/profile — view and edit your profile

Organizers:
/newevent — publish a new event
/newfacility — register a facility
/facilities — your facilities

/cancel — abort the current flow
/help — this message

Tap an event to see details and join its waiting list. Leaving an event \
always asks for confirmation first.";

    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}
