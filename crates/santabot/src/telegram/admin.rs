//! Admin bot: participant list, detail cards, field editing and exports.
//!
//! Participants are never deleted here, and new ones only come from the
//! registration dialog of the user bot.

use std::fmt;

use fluent_templates::fluent_bundle::FluentValue;
use santacore::config::admin_panel::PAGE_SIZE;
use santacore::export::{self, ExportFormat};
use santacore::storage::{participants, EditableField, Participant};
use santacore::{AppError, DbSession};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use unic_langid::LanguageIdentifier;

use crate::i18n;
use crate::telegram::handlers::HandlerError;
use crate::telegram::registration::validation_message;
use crate::telegram::reply::present;
use crate::telegram::state::{AdminDialogue, AdminState};

/// Value an admin sends to clear the comment.
pub const CLEAR_COMMENT: &str = "-";

const MAX_BUTTON_NAME_CHARS: usize = 32;

/// Callback actions of the admin keyboards, encoded as `adm:<action>:<args>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Page(usize),
    View(i64),
    Edit(i64, EditableField),
    CancelEdit(i64),
    Toggle(i64),
    Export(ExportFormat),
}

impl AdminAction {
    pub fn parse(data: &str) -> Option<Self> {
        let rest = data.strip_prefix("adm:")?;
        let parts: Vec<&str> = rest.split(':').collect();

        match parts.as_slice() {
            ["page", page] => page.parse().ok().map(AdminAction::Page),
            ["view", id] => id.parse().ok().map(AdminAction::View),
            ["edit", id, field] => Some(AdminAction::Edit(id.parse().ok()?, field.parse().ok()?)),
            ["cancel", id] => id.parse().ok().map(AdminAction::CancelEdit),
            ["toggle", id] => id.parse().ok().map(AdminAction::Toggle),
            ["export", format] => format.parse().ok().map(AdminAction::Export),
            _ => None,
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAction::Page(page) => write!(f, "adm:page:{}", page),
            AdminAction::View(id) => write!(f, "adm:view:{}", id),
            AdminAction::Edit(id, field) => write!(f, "adm:edit:{}:{}", id, field),
            AdminAction::CancelEdit(id) => write!(f, "adm:cancel:{}", id),
            AdminAction::Toggle(id) => write!(f, "adm:toggle:{}", id),
            AdminAction::Export(format) => write!(f, "adm:export:{}", format),
        }
    }
}

fn button(text: impl Into<String>, action: AdminAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), action.to_string())
}

/// Page position inside the participant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Zero-based page index, clamped to the last page
    pub index: usize,
    /// Total pages, at least one
    pub pages: usize,
    pub offset: usize,
}

impl PageWindow {
    pub fn new(total: usize, requested: usize, page_size: usize) -> Self {
        let pages = total.div_ceil(page_size).max(1);
        let index = requested.min(pages - 1);
        Self {
            index,
            pages,
            offset: index * page_size,
        }
    }
}

fn short_name(ifo: &str) -> String {
    if ifo.chars().count() <= MAX_BUTTON_NAME_CHARS {
        ifo.to_string()
    } else {
        let mut name: String = ifo.chars().take(MAX_BUTTON_NAME_CHARS - 1).collect();
        name.push('…');
        name
    }
}

pub fn render_list(
    lang: &LanguageIdentifier,
    page: &[Participant],
    window: PageWindow,
    total: usize,
) -> (String, InlineKeyboardMarkup) {
    if total == 0 {
        return (i18n::t(lang, "admin-list-empty"), InlineKeyboardMarkup::default());
    }

    let text = i18n::t_args(
        lang,
        "admin-list-header",
        &[
            ("total", FluentValue::from(total as i64)),
            ("page", FluentValue::from((window.index + 1) as i64)),
            ("pages", FluentValue::from(window.pages as i64)),
        ],
    );

    let mut rows: Vec<Vec<InlineKeyboardButton>> = page
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|p| button(format!("#{} {}", p.id, short_name(&p.ifo)), AdminAction::View(p.id)))
                .collect()
        })
        .collect();

    let mut nav = Vec::new();
    if window.index > 0 {
        nav.push(button(i18n::t(lang, "admin-prev-button"), AdminAction::Page(window.index - 1)));
    }
    if window.index + 1 < window.pages {
        nav.push(button(i18n::t(lang, "admin-next-button"), AdminAction::Page(window.index + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    rows.push(
        ExportFormat::ALL
            .iter()
            .map(|format| button(format!("📄 {}", format.as_str().to_uppercase()), AdminAction::Export(*format)))
            .collect(),
    );

    (text, InlineKeyboardMarkup::new(rows))
}

fn field_label(lang: &LanguageIdentifier, field: EditableField) -> String {
    let key = match field {
        EditableField::Ifo => "admin-field-ifo",
        EditableField::Address => "admin-field-address",
        EditableField::PhoneNumber => "admin-field-phone",
        EditableField::Comment => "admin-field-comment",
    };
    i18n::t(lang, key)
}

pub fn render_card(lang: &LanguageIdentifier, p: &Participant) -> (String, InlineKeyboardMarkup) {
    let username = if p.username.is_empty() {
        i18n::t(lang, "admin-no-username")
    } else {
        format!("@{}", p.username)
    };
    let comment = p.comment.clone().unwrap_or_else(|| i18n::t(lang, "reg-no-comment"));

    let text = i18n::t_args(
        lang,
        "admin-card",
        &[
            ("id", FluentValue::from(p.id.to_string())),
            ("telegram_id", FluentValue::from(p.telegram_user_id.to_string())),
            ("username", FluentValue::from(username)),
            ("ifo", FluentValue::from(p.ifo.clone())),
            ("option", FluentValue::from(i18n::delivery_label(lang, p.address_option))),
            ("address", FluentValue::from(p.address.clone())),
            ("phone", FluentValue::from(p.phone_number.clone())),
            ("comment", FluentValue::from(comment)),
            ("created", FluentValue::from(p.created_at.clone())),
            ("updated", FluentValue::from(p.updated_at.clone())),
        ],
    );

    let edit = |field: EditableField| {
        button(
            i18n::t_args(lang, "admin-edit-button", &[("field", FluentValue::from(field_label(lang, field)))]),
            AdminAction::Edit(p.id, field),
        )
    };
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![edit(EditableField::Ifo), edit(EditableField::Address)],
        vec![edit(EditableField::PhoneNumber), edit(EditableField::Comment)],
        vec![button(i18n::t(lang, "admin-toggle-delivery-button"), AdminAction::Toggle(p.id))],
        vec![button(i18n::t(lang, "admin-back-button"), AdminAction::Page(0))],
    ]);

    (text, keyboard)
}

async fn show_list(
    bot: &Bot,
    session: &DbSession,
    lang: &LanguageIdentifier,
    chat_id: ChatId,
    edit: Option<MessageId>,
    requested_page: usize,
) -> Result<(), HandlerError> {
    let (window, page, total) = session.with_conn(|conn| {
        let total = participants::count(conn)? as usize;
        let window = PageWindow::new(total, requested_page, PAGE_SIZE);
        let page = participants::list_page(conn, window.offset, PAGE_SIZE)?;
        Ok((window, page, total))
    })?;

    let (text, keyboard) = render_list(lang, &page, window, total);
    present(bot, chat_id, edit, text, keyboard).await?;
    Ok(())
}

async fn show_card(
    bot: &Bot,
    session: &DbSession,
    lang: &LanguageIdentifier,
    chat_id: ChatId,
    edit: Option<MessageId>,
    participant_id: i64,
) -> Result<(), HandlerError> {
    match session.with_conn(|conn| participants::get_by_id(conn, participant_id)) {
        Ok(participant) => {
            let (text, keyboard) = render_card(lang, &participant);
            present(bot, chat_id, edit, text, keyboard).await?;
        }
        Err(AppError::NotFound(id)) => {
            bot.send_message(chat_id, not_found(lang, id)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn not_found(lang: &LanguageIdentifier, id: i64) -> String {
    i18n::t_args(lang, "admin-not-found", &[("id", FluentValue::from(id.to_string()))])
}

/// `/admin`: resets any pending edit and shows the first page.
pub async fn handle_admin_command(
    bot: Bot,
    dialogue: AdminDialogue,
    msg: Message,
    session: DbSession,
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));
    dialogue.update(AdminState::Idle).await?;
    show_list(&bot, &session, &lang, msg.chat.id, None, 0).await
}

pub async fn handle_callback(
    bot: Bot,
    dialogue: AdminDialogue,
    q: CallbackQuery,
    session: DbSession,
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(q.from.language_code.as_deref());
    let chat_id = dialogue.chat_id();
    let message_id = q.message.as_ref().map(|m| m.id());

    let Some(action) = q.data.as_deref().and_then(AdminAction::parse) else {
        bot.answer_callback_query(q.id.clone())
            .text(i18n::t(&lang, "stale-button"))
            .await?;
        return Ok(());
    };
    bot.answer_callback_query(q.id.clone()).await?;

    match action {
        AdminAction::Page(page) => show_list(&bot, &session, &lang, chat_id, message_id, page).await?,
        AdminAction::View(id) => show_card(&bot, &session, &lang, chat_id, message_id, id).await?,
        AdminAction::Edit(id, field) => {
            let exists = session.with_conn(|conn| match participants::get_by_id(conn, id) {
                Ok(_) => Ok(true),
                Err(AppError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            })?;
            if !exists {
                bot.send_message(chat_id, not_found(&lang, id)).await?;
                return Ok(());
            }

            dialogue
                .update(AdminState::Editing {
                    participant_id: id,
                    field,
                })
                .await?;

            let mut prompt = i18n::t_args(
                &lang,
                "admin-edit-prompt",
                &[("field", FluentValue::from(field_label(&lang, field)))],
            );
            if field == EditableField::Comment {
                prompt.push('\n');
                prompt.push_str(&i18n::t(&lang, "admin-edit-comment-hint"));
            }
            let keyboard = InlineKeyboardMarkup::new(vec![vec![button(
                i18n::t(&lang, "admin-cancel-button"),
                AdminAction::CancelEdit(id),
            )]]);
            bot.send_message(chat_id, prompt).reply_markup(keyboard).await?;
        }
        AdminAction::CancelEdit(id) => {
            dialogue.update(AdminState::Idle).await?;
            show_card(&bot, &session, &lang, chat_id, message_id, id).await?;
        }
        AdminAction::Toggle(id) => {
            let toggled = session.transaction(|tx| {
                let current = participants::get_by_id(tx, id)?;
                let toggled = current.address_option.toggled();
                participants::set_delivery_option(tx, id, toggled)?;
                Ok(toggled)
            });
            match toggled {
                Ok(option) => {
                    log::info!(
                        "Admin {} set delivery option of participant #{} to {}",
                        q.from.id.0,
                        id,
                        option
                    );
                    show_card(&bot, &session, &lang, chat_id, message_id, id).await?;
                }
                Err(AppError::NotFound(id)) => {
                    bot.send_message(chat_id, not_found(&lang, id)).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        AdminAction::Export(format) => {
            let all = session.with_conn(|conn| participants::list_all(conn))?;
            let content = export::render(&all, format)?;
            log::info!(
                "Admin {} exported {} participants as {}",
                q.from.id.0,
                all.len(),
                format
            );

            let caption = i18n::t_args(
                &lang,
                "admin-export-caption",
                &[("total", FluentValue::from(all.len() as i64))],
            );
            bot.send_document(chat_id, InputFile::memory(content.into_bytes()).file_name(format.file_name()))
                .caption(caption)
                .await?;
        }
    }

    Ok(())
}

/// Text sent while an edit is pending becomes the new field value.
pub async fn handle_edit_value(
    bot: Bot,
    dialogue: AdminDialogue,
    msg: Message,
    session: DbSession,
    (participant_id, field): (i64, EditableField),
) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, i18n::t(&lang, "reg-text-expected")).await?;
        return Ok(());
    };
    // Commands other than /admin are never stored as a field value
    if text.trim_start().starts_with('/') {
        bot.send_message(msg.chat.id, i18n::t(&lang, "admin-edit-command-ignored")).await?;
        return Ok(());
    }
    let raw = if field == EditableField::Comment && text.trim() == CLEAR_COMMENT {
        ""
    } else {
        text
    };

    match session.transaction(|tx| participants::update_field(tx, participant_id, field, raw)) {
        Ok(()) => {
            let admin = msg.from.as_ref().map(|u| u.id.0).unwrap_or_default();
            log::info!("Admin {} updated {} of participant #{}", admin, field, participant_id);

            dialogue.update(AdminState::Idle).await?;
            bot.send_message(msg.chat.id, i18n::t(&lang, "admin-saved")).await?;
            show_card(&bot, &session, &lang, msg.chat.id, None, participant_id).await?;
        }
        Err(AppError::Validation(err)) => {
            bot.send_message(msg.chat.id, validation_message(&lang, &err)).await?;
        }
        Err(AppError::NotFound(id)) => {
            dialogue.update(AdminState::Idle).await?;
            bot.send_message(msg.chat.id, not_found(&lang, id)).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Messages from anyone but the configured administrator.
pub async fn deny_message(bot: Bot, msg: Message) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or_default();
    log::warn!("User {} tried to use the admin bot", user_id);

    bot.send_message(msg.chat.id, i18n::t(&lang, "admin-no-rights")).await?;
    Ok(())
}

pub async fn deny_callback(bot: Bot, q: CallbackQuery) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(q.from.language_code.as_deref());
    log::warn!("User {} pressed an admin button", q.from.id.0);

    bot.answer_callback_query(q.id.clone())
        .text(i18n::t(&lang, "admin-no-rights"))
        .show_alert(true)
        .await?;
    Ok(())
}

/// Any other admin message.
pub async fn handle_hint(bot: Bot, msg: Message) -> Result<(), HandlerError> {
    let lang = i18n::lang_from_code(msg.from.as_ref().and_then(|u| u.language_code.as_deref()));
    bot.send_message(msg.chat.id, i18n::t(&lang, "admin-hint")).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use santacore::DeliveryOption;
    use unic_langid::langid;

    fn participant(id: i64, ifo: &str) -> Participant {
        Participant {
            id,
            telegram_user_id: 1000 + id,
            username: String::new(),
            ifo: ifo.to_string(),
            address_option: DeliveryOption::Pickup,
            address: "Main St 1".to_string(),
            phone_number: "+1000".to_string(),
            comment: None,
            created_at: "2026-12-01 10:00:00".to_string(),
            updated_at: "2026-12-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_action_parse_and_display() {
        let actions = [
            AdminAction::Page(3),
            AdminAction::View(12),
            AdminAction::Edit(12, EditableField::PhoneNumber),
            AdminAction::CancelEdit(12),
            AdminAction::Toggle(5),
            AdminAction::Export(ExportFormat::Json),
        ];
        for action in actions {
            assert_eq!(AdminAction::parse(&action.to_string()), Some(action));
        }
        assert_eq!(AdminAction::Edit(1, EditableField::Comment).to_string(), "adm:edit:1:comment");
    }

    #[test]
    fn test_action_parse_rejects_garbage() {
        assert_eq!(AdminAction::parse("adm:page:-1"), None);
        assert_eq!(AdminAction::parse("adm:edit:1:telegram_user_id"), None);
        assert_eq!(AdminAction::parse("adm:view"), None);
        assert_eq!(AdminAction::parse("adm:view:1:2"), None);
        assert_eq!(AdminAction::parse("reg:cancel"), None);
        assert_eq!(AdminAction::parse("adm:export:xml"), None);
    }

    #[test]
    fn test_page_window() {
        assert_eq!(PageWindow::new(0, 0, 8), PageWindow { index: 0, pages: 1, offset: 0 });
        assert_eq!(PageWindow::new(8, 1, 8), PageWindow { index: 0, pages: 1, offset: 0 });
        assert_eq!(PageWindow::new(9, 1, 8), PageWindow { index: 1, pages: 2, offset: 8 });
        assert_eq!(PageWindow::new(20, 99, 8), PageWindow { index: 2, pages: 3, offset: 16 });
    }

    #[test]
    fn test_render_list_navigation() {
        let en = langid!("en");
        let page: Vec<Participant> = (1..=8).map(|id| participant(id, "Ivan")).collect();
        let (text, keyboard) = render_list(&en, &page, PageWindow::new(20, 1, 8), 20);

        assert_eq!(text, "🎅 Participants: 20 (page 2 of 3)");
        let rows = &keyboard.inline_keyboard;
        assert_eq!(rows.len(), 4 + 1 + 1, "four rows of two, navigation, export");
        assert_eq!(rows[4].len(), 2, "both directions on a middle page");
        assert_eq!(rows[5].len(), ExportFormat::ALL.len());
    }

    #[test]
    fn test_render_list_empty() {
        let en = langid!("en");
        let (text, keyboard) = render_list(&en, &[], PageWindow::new(0, 0, 8), 0);
        assert_eq!(text, "Nobody has registered yet.");
        assert!(keyboard.inline_keyboard.is_empty());
    }

    #[test]
    fn test_render_card() {
        let ru = langid!("ru");
        let mut p = participant(3, "Ivan");
        p.username = "ivan".to_string();
        let (text, keyboard) = render_card(&ru, &p);

        assert!(text.starts_with("Участник #3\nTelegram ID: 1003\nUsername: @ivan\n"), "{}", text);
        assert!(text.contains("Комментарий: Без комментариев"));
        assert_eq!(keyboard.inline_keyboard.len(), 4);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Ivan"), "Ivan");
        let long = "Я".repeat(40);
        assert_eq!(short_name(&long).chars().count(), MAX_BUTTON_NAME_CHARS);
    }
}
