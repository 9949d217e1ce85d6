//! Bot initialization and command menus
//!
//! This module contains:
//! - Command enums of the user bot and the admin bot
//! - Bot instance creation (shared HTTP timeout, optional custom Bot API server)
//! - Command menu registration

use reqwest::ClientBuilder;
use secrecy::{ExposeSecret, SecretString};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use santacore::config;

/// Commands of the participant-facing bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum UserCommand {
    #[command(description = "Начать работу с ботом")]
    Start,
}

/// Commands of the admin bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды администратора:")]
pub enum AdminCommand {
    #[command(description = "Админ-панель")]
    Admin,
}

/// Creates a bot with the shared request timeout.
///
/// # Arguments
/// * `token` - Bot token
/// * `bot_api_url` - Custom Bot API server, `None` for api.telegram.org
pub fn create_bot(token: &SecretString, bot_api_url: Option<&str>) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    match bot_api_url {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Registers `/start` in the user bot's command menu.
pub async fn setup_user_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(UserCommand::bot_commands()).await?;
    Ok(())
}

/// Registers `/admin` in the admin bot's command menu.
pub async fn setup_admin_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(AdminCommand::bot_commands()).await?;
    Ok(())
}
