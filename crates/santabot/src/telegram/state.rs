//! Dialogue states of both bots.

use santacore::storage::EditableField;
use santacore::RegistrationFlow;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Per-chat state of the user bot.
///
/// The registration draft lives inside [`State::Registration`], so leaving that
/// state in any way drops it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// Nothing shown yet (fresh chat or after a restart)
    #[default]
    Idle,
    /// Main menu is on screen
    Menu,
    /// Registration dialog in progress
    Registration(RegistrationFlow),
}

pub type UserDialogue = Dialogue<State, InMemStorage<State>>;

/// Per-chat state of the admin bot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AdminState {
    #[default]
    Idle,
    /// The next text message becomes the new value of `field`
    Editing { participant_id: i64, field: EditableField },
}

pub type AdminDialogue = Dialogue<AdminState, InMemStorage<AdminState>>;
