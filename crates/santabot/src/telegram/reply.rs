use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};

/// Replaces the text and keyboard of `edit`, or sends a new message when there is
/// nothing to edit or Telegram refuses the edit.
pub async fn present(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    if let Some(message_id) = edit {
        match bot
            .edit_message_text(chat_id, message_id, text.clone())
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => log::debug!("Edit of message {} in chat {} failed, sending anew: {}", message_id.0, chat_id.0, e),
        }
    }

    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}
