use teloxide::prelude::*;
use std::error::Error;

use crate::bot_state::BotState;
use crate::handlers::callbacks::{list_user_bookings, present_date_options};
use crate::handlers::messages::greeting;
use crate::handlers::utils::main_menu_keyboard;

use crate::Command;

const HELP_TEXT: &str = "🎾 Tennis court booking\n\n\
    /start - main menu\n\
    /book - check availability and pick slots\n\
    /mybookings - list or cancel your bookings\n\n\
    Pick a date, tap one or more neighbouring 30-minute slots and press \
    \"Confirm Booking\". 🟢 marks your selection, ❌ marks slots someone else booked.";

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => handle_start(bot, msg).await?,
        Command::Help => handle_help(bot, msg).await?,
        Command::Book => present_date_options(&bot, msg.chat.id, &state).await?,
        Command::MyBookings => handle_my_bookings(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(msg.chat.id, greeting(msg.chat.first_name()))
        .reply_markup(main_menu_keyboard())
        .await?;

    Ok(())
}

async fn handle_help(
    bot: Bot,
    msg: Message,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(msg.chat.id, HELP_TEXT).await?;
    Ok(())
}

async fn handle_my_bookings(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    // Only a private chat tells us who is asking.
    match msg.chat.id.as_user() {
        Some(user_id) => list_user_bookings(&bot, msg.chat.id, user_id, &state).await?,
        None => {
            bot.send_message(msg.chat.id, "Please use the \"List my Bookings\" button instead.")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
    }
    Ok(())
}
