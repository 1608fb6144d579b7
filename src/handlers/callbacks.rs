use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode, UserId};
use std::error::Error;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::bot_state::{BotState, SessionKey};
use crate::engine::{BookingError, LedgerError, Rejected};
use crate::models::{Intent, PageCursor, PageView, Slot, UserIdentity};
use crate::handlers::utils::{
    cancel_booking_keyboard, escape_markdown_v2, make_date_keyboard, make_time_keyboard,
};

const GENERIC_FAILURE: &str = "⚠️ Something went wrong. Please try again.";
const TIME_OPTIONS_TEXT: &str = "Please choose a time slot(s):";
const BOOKED_NOTICE: &str = "This time slot is already booked by someone else.";

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let intent = match data.parse::<Intent>() {
        Ok(intent) => intent,
        Err(e) => {
            log::warn!("Ignoring callback '{}' from chat {}: {}", data, chat_id, e);
            acknowledge(&bot, q.id.clone(), None).await;
            return Ok(());
        }
    };

    let notice = (intent == Intent::Booked).then_some(BOOKED_NOTICE);
    acknowledge(&bot, q.id.clone(), notice).await;

    let identity = UserIdentity {
        user_id: q.from.id,
        chat_id,
        display_name: q.from.first_name.clone(),
    };
    handle_intent(&bot, intent, &identity, message_id, &state).await
}

/// Stops the button spinner. Telegram refuses to answer stale queries, so a
/// failure here is logged and the press is still handled.
async fn acknowledge(bot: &Bot, query_id: String, text: Option<&str>) {
    let mut answer = bot.answer_callback_query(query_id.clone());
    if let Some(text) = text {
        answer = answer.text(text);
    }
    if let Err(e) = answer.await {
        log::warn!("Failed to answer callback {}: {}", query_id, e);
    }
}

async fn handle_intent(
    bot: &Bot,
    intent: Intent,
    identity: &UserIdentity,
    message_id: MessageId,
    state: &BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = identity.chat_id;
    let key = SessionKey::new(chat_id, identity.user_id);

    match intent {
        Intent::CheckAvailability => present_date_options(bot, chat_id, state).await,
        Intent::Date(date) => present_time_options(bot, chat_id, key, state, date).await,
        Intent::ToggleTime(slot) => toggle_time_slot(bot, chat_id, message_id, key, state, slot).await,
        Intent::ChangePage { date, page } => {
            edit_time_options(bot, chat_id, message_id, key, state, date, page).await
        }
        Intent::ListBookings => list_user_bookings(bot, chat_id, identity.user_id, state).await,
        Intent::CancelBooking(id) => cancel_booking(bot, chat_id, identity.user_id, state, id).await,
        Intent::ConfirmBooking => confirm_booking(bot, key, identity, state).await,
        Intent::Booked | Intent::Ignore => Ok(()),
    }
}

async fn report_ledger_error(
    bot: &Bot,
    chat_id: ChatId,
    e: &LedgerError,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    log::error!("Ledger error for chat {}: {}", chat_id, e);
    bot.send_message(chat_id, GENERIC_FAILURE).await?;
    Ok(())
}

async fn report_booking_error(
    bot: &Bot,
    chat_id: ChatId,
    e: &BookingError,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match e {
        BookingError::Rejected(rejected) => {
            bot.send_message(chat_id, rejected.to_string()).await?;
            Ok(())
        }
        BookingError::Ledger(e) => report_ledger_error(bot, chat_id, e).await,
    }
}

pub async fn present_date_options(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let today = Local::now().date_naive();
    bot.send_message(chat_id, "Please choose a date:")
        .reply_markup(make_date_keyboard(today, state.config.booking_days_ahead))
        .await?;
    Ok(())
}

async fn render_page(
    state: &BotState,
    key: SessionKey,
    date: NaiveDate,
    page: usize,
) -> Result<PageView, LedgerError> {
    let selection = state.engine.selection(key).await;
    state.engine.page(date, &selection, page).await
}

/// Sends a fresh slot keyboard and remembers it for later in-place edits.
async fn present_time_options(
    bot: &Bot,
    chat_id: ChatId,
    key: SessionKey,
    state: &BotState,
    date: NaiveDate,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let view = match render_page(state, key, date, 0).await {
        Ok(view) => view,
        Err(e) => return report_ledger_error(bot, chat_id, &e).await,
    };

    let sent = bot
        .send_message(chat_id, TIME_OPTIONS_TEXT)
        .reply_markup(make_time_keyboard(&view))
        .await?;

    state
        .engine
        .remember_page(key, PageCursor { message_id: sent.id, date, page: view.page })
        .await;
    Ok(())
}

async fn edit_time_options(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    key: SessionKey,
    state: &BotState,
    date: NaiveDate,
    page: usize,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let view = match render_page(state, key, date, page).await {
        Ok(view) => view,
        Err(e) => return report_ledger_error(bot, chat_id, &e).await,
    };

    // Edit failures (deleted message, unchanged markup) are not worth a reply.
    if let Err(e) = bot
        .edit_message_text(chat_id, message_id, TIME_OPTIONS_TEXT)
        .reply_markup(make_time_keyboard(&view))
        .await
    {
        log::error!("Error editing time options in chat {}: {}", chat_id, e);
    }

    state
        .engine
        .remember_page(key, PageCursor { message_id, date, page: view.page })
        .await;
    Ok(())
}

async fn toggle_time_slot(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    key: SessionKey,
    state: &BotState,
    slot: Slot,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let selection = match state.engine.toggle(key, slot).await {
        Ok(selection) => selection,
        Err(e) => return report_booking_error(bot, chat_id, &e).await,
    };

    // Redraw the pressed keyboard, on the page it was last showing.
    let date = slot.date();
    let page = match selection.cursor {
        Some(cursor) if cursor.message_id == message_id && cursor.date == date => cursor.page,
        _ => state.engine.page_of(&slot),
    };
    edit_time_options(bot, chat_id, message_id, key, state, date, page).await
}

pub async fn list_user_bookings(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
    state: &BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let bookings = match state.engine.list_for(user_id).await {
        Ok(bookings) => bookings,
        Err(e) => return report_ledger_error(bot, chat_id, &e).await,
    };

    if bookings.is_empty() {
        bot.send_message(chat_id, "You have no bookings.").await?;
        return Ok(());
    }

    for booking in &bookings {
        bot.send_message(chat_id, format!("Booking on {}", booking.time_frame()))
            .reply_markup(cancel_booking_keyboard(booking))
            .await?;
    }

    Ok(())
}

async fn cancel_booking(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
    state: &BotState,
    booking_id: Uuid,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match state.engine.cancel(booking_id, user_id).await {
        Ok(_) => {
            bot.send_message(chat_id, "Your booking has been successfully canceled.")
                .await?;
            Ok(())
        }
        Err(e) => report_booking_error(bot, chat_id, &e).await,
    }
}

async fn confirm_booking(
    bot: &Bot,
    key: SessionKey,
    identity: &UserIdentity,
    state: &BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = identity.chat_id;
    let cursor = state.engine.selection(key).await.cursor;

    match state.engine.confirm(key, identity).await {
        Ok(booking) => {
            bot.send_message(
                chat_id,
                format!(
                    "✅ *Booking confirmed* for time frame: {}",
                    escape_markdown_v2(&booking.time_frame())
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }
        Err(BookingError::Rejected(Rejected::Conflict(slot))) => {
            bot.send_message(
                chat_id,
                format!(
                    "❌ {} Your selection was cleared, please choose again.",
                    Rejected::Conflict(slot)
                ),
            )
            .await?;
        }
        Err(e) => return report_booking_error(bot, chat_id, &e).await,
    }

    // The draft is gone either way; show the slots as they stand now.
    if let Some(cursor) = cursor {
        edit_time_options(bot, chat_id, cursor.message_id, key, state, cursor.date, cursor.page).await?;
    }
    Ok(())
}
