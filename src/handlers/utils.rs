use chrono::{Days, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::{Booking, Intent, PageView, SlotStatus};

/// Экранирование MarkdownV2
pub fn escape_markdown_v2(text: &str) -> String {
    let specials = ['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!'];
    let mut out = String::with_capacity(text.len() * 2);

    for ch in text.chars() {
        if specials.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn button(text: impl Into<String>, intent: Intent) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, intent.to_string())
}

/// Главное меню
pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("Check Availability", Intent::CheckAvailability)],
        vec![button("List my Bookings", Intent::ListBookings)],
    ])
}

/// One button per bookable day, starting with `today`.
pub fn make_date_keyboard(today: NaiveDate, days_ahead: u32) -> InlineKeyboardMarkup {
    let keyboard = (0..days_ahead)
        .filter_map(|offset| today.checked_add_days(Days::new(offset.into())))
        .map(|date| vec![button(date.format("%Y-%m-%d").to_string(), Intent::Date(date))])
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_time_keyboard(view: &PageView) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = view
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let time = cell.slot.time_label();
                    match cell.status {
                        SlotStatus::HeldByMe => button(format!("🟢 {}", time), Intent::ToggleTime(cell.slot)),
                        SlotStatus::HeldByOther => button(format!("❌ {}", time), Intent::Booked),
                        SlotStatus::Free => button(time, Intent::ToggleTime(cell.slot)),
                    }
                })
                .collect()
        })
        .collect();

    // Кнопки навигации
    let mut navigation = Vec::new();
    if view.has_previous {
        navigation.push(button("<<", Intent::ChangePage { date: view.date, page: view.page - 1 }));
    }
    if view.has_next {
        navigation.push(button(">>", Intent::ChangePage { date: view.date, page: view.page + 1 }));
    }
    if !navigation.is_empty() {
        keyboard.push(navigation);
    }

    if view.can_confirm {
        keyboard.push(vec![button("🟢 Confirm Booking", Intent::ConfirmBooking)]);
    }

    InlineKeyboardMarkup::new(keyboard)
}

pub fn cancel_booking_keyboard(booking: &Booking) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "Cancel Booking",
        Intent::CancelBooking(booking.id),
    )]])
}
