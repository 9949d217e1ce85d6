//! Dispatcher schemas of both bots
//!
//! Every update first gets its own [`DbSession`] (released when the update is
//! done), then the chat's dialogue state, then is routed to an endpoint.

use std::sync::Arc;

use santacore::DbSession;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use super::types::{AdminDeps, HandlerDeps, HandlerError};
use crate::telegram::bot::{AdminCommand, UserCommand};
use crate::telegram::state::{AdminState, State};
use crate::telegram::{admin, menu, registration};

/// Creates the dispatcher schema of the user bot.
///
/// The same schema is used in production and in integration tests. The
/// dependency map must contain `Arc<InMemStorage<State>>`.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let session_pool = Arc::clone(&deps.db_pool);

    dptree::entry()
        .map(move || DbSession::open(&session_pool))
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(command_handler())
        .branch(message_handler())
        .branch(callback_handler())
}

/// `/start` works in any state
fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<UserCommand>()
        .branch(dptree::case![UserCommand::Start].endpoint(menu::handle_start))
}

fn message_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .branch(dptree::case![State::Registration(flow)].endpoint(registration::handle_message))
        .endpoint(menu::handle_hint)
}

fn callback_handler() -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .branch(dptree::case![State::Registration(flow)].endpoint(registration::handle_callback))
        .branch(
            dptree::filter(|q: CallbackQuery| q.data.as_deref() == Some(menu::REGISTER_CALLBACK))
                .endpoint(menu::handle_register),
        )
        .endpoint(menu::handle_stale_callback)
}

/// Creates the dispatcher schema of the admin bot.
///
/// Everyone except `deps.admin_id` is turned away before any state is touched.
/// The dependency map must contain `Arc<InMemStorage<AdminState>>`.
pub fn admin_schema(deps: AdminDeps) -> UpdateHandler<HandlerError> {
    let session_pool = Arc::clone(&deps.db_pool);
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        .map(move || DbSession::open(&session_pool))
        .enter_dialogue::<Update, InMemStorage<AdminState>, AdminState>()
        .branch(admin_message_handler(deps_messages))
        .branch(admin_callback_handler(deps_callbacks))
}

fn admin_message_handler(deps: AdminDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .branch(dptree::filter(move |msg: Message| !deps.is_admin(msg.from.as_ref())).endpoint(admin::deny_message))
        .branch(
            dptree::entry()
                .filter_command::<AdminCommand>()
                .branch(dptree::case![AdminCommand::Admin].endpoint(admin::handle_admin_command)),
        )
        .branch(
            dptree::case![AdminState::Editing {
                participant_id,
                field
            }]
            .endpoint(admin::handle_edit_value),
        )
        .endpoint(admin::handle_hint)
}

fn admin_callback_handler(deps: AdminDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query()
        .branch(dptree::filter(move |q: CallbackQuery| !deps.is_admin(Some(&q.from))).endpoint(admin::deny_callback))
        .endpoint(admin::handle_callback)
}
