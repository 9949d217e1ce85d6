//! Main menu of the user bot.

use santacore::storage::participants;
use santacore::{DbSession, RegistrationFlow};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use unic_langid::LanguageIdentifier;

use crate::i18n;
use crate::telegram::handlers::{telegram_user_id, HandlerError};
use crate::telegram::registration;
use crate::telegram::state::{State, UserDialogue};

pub const REGISTER_CALLBACK: &str = "menu:register";

pub fn menu_keyboard(lang: &LanguageIdentifier) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        i18n::t(lang, "menu-register-button"),
        REGISTER_CALLBACK,
    )]])
}

pub async fn send_menu(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> ResponseResult<Message> {
    bot.send_message(chat_id, i18n::t(lang, "menu-text"))
        .reply_markup(menu_keyboard(lang))
        .await
}

/// `/start`: drops whatever dialog was running and shows the menu.
pub async fn handle_start(bot: Bot, dialogue: UserDialogue, msg: Message) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));

    dialogue.update(State::Menu).await?;
    send_menu(&bot, msg.chat.id, &lang).await?;
    Ok(())
}

/// "Register" button. Registered users get an alert and stay where they are.
pub async fn handle_register(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    session: DbSession,
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(q.from.language_code.as_deref());
    let user_id = telegram_user_id(&q.from)?;

    let registered = session.with_conn(|conn| participants::is_registered(conn, user_id))?;
    if registered {
        log::info!("User {} is already registered, registration not started", user_id);
        bot.answer_callback_query(q.id.clone())
            .text(i18n::t(&lang, "already-registered"))
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    log::info!("User {} started registration", user_id);
    let flow = RegistrationFlow::start();
    dialogue.update(State::Registration(flow.clone())).await?;
    registration::send_step(&bot, dialogue.chat_id(), &lang, &flow).await?;
    Ok(())
}

/// Buttons that belong to no running dialog.
pub async fn handle_stale_callback(bot: Bot, q: CallbackQuery) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(q.from.language_code.as_deref());
    bot.answer_callback_query(q.id.clone())
        .text(i18n::t(&lang, "stale-button"))
        .await?;
    Ok(())
}

/// Any other message outside the registration dialog.
pub async fn handle_hint(bot: Bot, msg: Message) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));
    bot.send_message(msg.chat.id, i18n::t(&lang, "start-hint")).await?;
    Ok(())
}
