//! Telegram side of the Secret Santa bots
//!
//! - `bot`: command enums, bot construction, command menus
//! - `handlers`: dispatcher schemas and dependencies
//! - `state`: dialogue states
//! - `menu`: user bot main menu
//! - `registration`: user bot registration dialog
//! - `admin`: admin bot panel

pub mod admin;
pub mod bot;
pub mod handlers;
pub mod menu;
pub mod registration;
pub mod reply;
pub mod state;

pub use bot::{create_bot, setup_admin_commands, setup_user_commands, AdminCommand, UserCommand};
pub use handlers::{admin_schema, schema, AdminDeps, HandlerDeps, HandlerError};
pub use state::{AdminDialogue, AdminState, State, UserDialogue};
