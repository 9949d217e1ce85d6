//! Registration dialog of the user bot.
//!
//! Updates are translated into [`RegistrationEvent`]s, the pure
//! [`RegistrationFlow`] decides what happens, and this module renders the result:
//! the next prompt, a re-prompt with the validation error, or the menu once the
//! dialog is finished or cancelled. The participant row is written only on
//! confirmation, inside one transaction of the update's [`DbSession`].

use fluent_templates::fluent_bundle::FluentValue;
use santacore::storage::participants;
use santacore::{DbSession, DeliveryOption, RegistrationEvent, RegistrationFlow, RegistrationStep, Transition, ValidationError};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, User};
use unic_langid::LanguageIdentifier;

use crate::i18n;
use crate::telegram::handlers::{telegram_user_id, HandlerError};
use crate::telegram::menu;
use crate::telegram::reply::present;
use crate::telegram::state::{State, UserDialogue};

pub const CANCEL_CALLBACK: &str = "reg:cancel";
pub const SKIP_CALLBACK: &str = "reg:skip";
pub const CONFIRM_CALLBACK: &str = "reg:confirm";
pub const OPTION_CALLBACK_PREFIX: &str = "reg:opt:";

const RADIO_ON: &str = "🔘";
const RADIO_OFF: &str = "⚪️";

/// Maps callback data of the dialog keyboards to an event.
pub fn event_from_callback(data: &str) -> Option<RegistrationEvent> {
    match data {
        CANCEL_CALLBACK => Some(RegistrationEvent::Cancel),
        SKIP_CALLBACK => Some(RegistrationEvent::SkipComment),
        CONFIRM_CALLBACK => Some(RegistrationEvent::Confirm),
        _ => data
            .strip_prefix(OPTION_CALLBACK_PREFIX)
            .and_then(|option| option.parse::<DeliveryOption>().ok())
            .map(RegistrationEvent::SelectDelivery),
    }
}

pub fn option_callback(option: DeliveryOption) -> String {
    format!("{}{}", OPTION_CALLBACK_PREFIX, option.as_str())
}

pub fn validation_message(lang: &LanguageIdentifier, err: &ValidationError) -> String {
    match err {
        ValidationError::Empty => i18n::t(lang, "reg-error-empty"),
        ValidationError::TooLong { max } => {
            i18n::t_args(lang, "reg-error-too-long", &[("max", FluentValue::from(*max as i64))])
        }
    }
}

fn cancel_button(lang: &LanguageIdentifier) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(i18n::t(lang, "reg-cancel-button"), CANCEL_CALLBACK)
}

/// Prompt text and keyboard for the current step.
pub fn render_step(lang: &LanguageIdentifier, flow: &RegistrationFlow) -> (String, InlineKeyboardMarkup) {
    let draft = flow.draft();

    match flow.step() {
        RegistrationStep::Ifo => (
            i18n::t(lang, "reg-ifo-prompt"),
            InlineKeyboardMarkup::new(vec![vec![cancel_button(lang)]]),
        ),
        RegistrationStep::Address => {
            let radio: Vec<InlineKeyboardButton> = DeliveryOption::ALL
                .iter()
                .map(|option| {
                    let mark = if *option == draft.delivery { RADIO_ON } else { RADIO_OFF };
                    InlineKeyboardButton::callback(
                        format!("{} {}", mark, i18n::delivery_label(lang, *option)),
                        option_callback(*option),
                    )
                })
                .collect();
            let text = i18n::t_args(
                lang,
                "reg-address-prompt",
                &[("option", FluentValue::from(i18n::delivery_label(lang, draft.delivery)))],
            );
            (text, InlineKeyboardMarkup::new(vec![radio, vec![cancel_button(lang)]]))
        }
        RegistrationStep::Phone => (
            i18n::t(lang, "reg-phone-prompt"),
            InlineKeyboardMarkup::new(vec![vec![cancel_button(lang)]]),
        ),
        RegistrationStep::Comment => (
            i18n::t(lang, "reg-comment-prompt"),
            InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback(i18n::t(lang, "reg-skip-button"), SKIP_CALLBACK),
                cancel_button(lang),
            ]]),
        ),
        RegistrationStep::Confirm => {
            let comment = draft
                .comment
                .clone()
                .unwrap_or_else(|| i18n::t(lang, "reg-no-comment"));
            let text = i18n::t_args(
                lang,
                "reg-confirm",
                &[
                    ("ifo", FluentValue::from(draft.ifo.clone().unwrap_or_default())),
                    ("option", FluentValue::from(i18n::delivery_label(lang, draft.delivery))),
                    ("address", FluentValue::from(draft.address.clone().unwrap_or_default())),
                    ("phone", FluentValue::from(draft.phone_number.clone().unwrap_or_default())),
                    ("comment", FluentValue::from(comment)),
                ],
            );
            let keyboard = InlineKeyboardMarkup::new(vec![
                vec![InlineKeyboardButton::callback(
                    i18n::t(lang, "reg-confirm-button"),
                    CONFIRM_CALLBACK,
                )],
                vec![cancel_button(lang)],
            ]);
            (text, keyboard)
        }
    }
}

pub async fn send_step(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    flow: &RegistrationFlow,
) -> ResponseResult<Message> {
    let (text, keyboard) = render_step(lang, flow);
    bot.send_message(chat_id, text).reply_markup(keyboard).await
}

/// Text answers (and anything else the user sends) during registration.
pub async fn handle_message(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    session: DbSession,
    flow: RegistrationFlow,
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, i18n::t(&lang, "reg-text-expected")).await?;
        send_step(&bot, msg.chat.id, &lang, &flow).await?;
        return Ok(());
    };

    let event = RegistrationEvent::Text(text.to_string());
    apply(&bot, &dialogue, &session, msg.from.as_ref(), &lang, flow, event, None).await
}

/// Inline buttons of the dialog keyboards.
pub async fn handle_callback(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    session: DbSession,
    flow: RegistrationFlow,
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(q.from.language_code.as_deref());
    bot.answer_callback_query(q.id.clone()).await?;

    let origin = q.message.as_ref().map(|m| m.id());
    match q.data.as_deref().and_then(event_from_callback) {
        Some(event) => apply(&bot, &dialogue, &session, Some(&q.from), &lang, flow, event, origin).await,
        None => {
            // Button from an older keyboard
            send_step(&bot, dialogue.chat_id(), &lang, &flow).await?;
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply(
    bot: &Bot,
    dialogue: &UserDialogue,
    session: &DbSession,
    user: Option<&User>,
    lang: &LanguageIdentifier,
    flow: RegistrationFlow,
    event: RegistrationEvent,
    origin: Option<MessageId>,
) -> Result<(), HandlerError> {
    let chat_id = dialogue.chat_id();
    let previous_delivery = flow.draft().delivery;

    match flow.handle(event) {
        Transition::Advanced(next) => {
            dialogue.update(State::Registration(next.clone())).await?;
            send_step(bot, chat_id, lang, &next).await?;
        }
        Transition::Updated(next) => {
            let changed = next.draft().delivery != previous_delivery;
            dialogue.update(State::Registration(next.clone())).await?;
            if changed {
                let (text, keyboard) = render_step(lang, &next);
                present(bot, chat_id, origin, text, keyboard).await?;
            }
        }
        Transition::Rejected(current, err) => {
            bot.send_message(chat_id, validation_message(lang, &err)).await?;
            send_step(bot, chat_id, lang, &current).await?;
        }
        Transition::Ignored(current) => {
            send_step(bot, chat_id, lang, &current).await?;
        }
        Transition::Cancelled => {
            log::info!("Registration cancelled in chat {}", chat_id.0);
            dialogue.update(State::Menu).await?;
            bot.send_message(chat_id, i18n::t(lang, "reg-cancelled")).await?;
            menu::send_menu(bot, chat_id, lang).await?;
        }
        Transition::Completed(registration) => {
            let user = user.ok_or("registration confirmed without a sender")?;
            let user_id = telegram_user_id(user)?;
            let username = user.username.clone();

            let outcome = match session.transaction(|tx| {
                participants::save_registration(tx, user_id, username.as_deref(), &registration)
            }) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("Failed to save registration of user {}: {}", user_id, e);
                    bot.send_message(chat_id, i18n::t(lang, "reg-failed")).await?;
                    return Err(e.into());
                }
            };

            log::info!(
                "User {} {} participant #{}",
                user_id,
                if outcome.created { "registered as" } else { "updated" },
                outcome.participant_id
            );

            dialogue.update(State::Menu).await?;
            let done = i18n::t_args(
                lang,
                "reg-done",
                &[("id", FluentValue::from(outcome.participant_id))],
            );
            bot.send_message(chat_id, done).await?;
            menu::send_menu(bot, chat_id, lang).await?;
        }
    }

    Ok(())
}
