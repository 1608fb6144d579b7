use teloxide::prelude::*;
use std::error::Error;

use crate::handlers::utils::main_menu_keyboard;

pub fn greeting(first_name: Option<&str>) -> String {
    format!(
        "Hello, {}! Welcome to the Tennis Court Booking Bot. What would you like to do?",
        first_name.unwrap_or("there")
    )
}

/// Any plain message opens the main menu.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if msg.text().is_some_and(|text| text.starts_with('/')) {
        return Ok(());
    }

    bot.send_message(msg.chat.id, greeting(msg.chat.first_name()))
        .reply_markup(main_menu_keyboard())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_by_first_name() {
        assert_eq!(
            greeting(Some("Ada")),
            "Hello, Ada! Welcome to the Tennis Court Booking Bot. What would you like to do?"
        );
        assert!(greeting(None).starts_with("Hello, there!"));
    }
}
