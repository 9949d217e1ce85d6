use anyhow::Result;
use dotenvy::dotenv;
use std::io::Write;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use santabot::cli::{Cli, Commands};
use santabot::telegram::{
    admin_schema, create_bot, schema, setup_admin_commands, setup_user_commands, AdminDeps, AdminState, HandlerDeps,
    State,
};
use santacore::config::{self, Config};
use santacore::export::{self, ExportFormat};
use santacore::logging::{init_logger, log_startup_configuration};
use santacore::storage::participants;
use santacore::{create_pool, get_connection};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the subcommand; no subcommand runs
/// both bots.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, database,
/// bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Replaces the default hook so panics from handler tasks end up in the log
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_logger(&config::log_file_path_from_env())?;
            run_bots().await
        }
        Commands::Migrate => {
            init_logger(&config::log_file_path_from_env())?;
            run_migrate()
        }
        // stdout may carry the dump, so no terminal logger here
        Commands::Export { format, output } => run_export(format, output.as_deref()),
    }
}

/// Starts the user bot and the admin bot on one runtime and waits for both.
async fn run_bots() -> Result<()> {
    let config = Config::from_env().inspect_err(|e| log::error!("{}", e))?;
    log_startup_configuration(&config);

    let db_pool = Arc::new(create_pool(&config.database_path)?);

    let user_bot = create_bot(&config.user_bot_token, config.bot_api_url.as_deref())?;
    let admin_bot = create_bot(&config.admin_bot_token, config.bot_api_url.as_deref())?;

    if let Err(e) = setup_user_commands(&user_bot).await {
        log::warn!("Failed to set user bot commands: {}", e);
    }
    if let Err(e) = setup_admin_commands(&admin_bot).await {
        log::warn!("Failed to set admin bot commands: {}", e);
    }

    let mut user_dispatcher = Dispatcher::builder(user_bot, schema(HandlerDeps::new(Arc::clone(&db_pool))))
        .dependencies(dptree::deps![InMemStorage::<State>::new()])
        .error_handler(LoggingErrorHandler::with_custom_text("An error in the user bot"))
        .enable_ctrlc_handler()
        .build();

    let mut admin_dispatcher = Dispatcher::builder(
        admin_bot,
        admin_schema(AdminDeps::new(Arc::clone(&db_pool), config.admin_id)),
    )
    .dependencies(dptree::deps![InMemStorage::<AdminState>::new()])
    .error_handler(LoggingErrorHandler::with_custom_text("An error in the admin bot"))
    .enable_ctrlc_handler()
    .build();

    log::info!("Starting user bot and admin bot");
    tokio::join!(user_dispatcher.dispatch(), admin_dispatcher.dispatch());
    log::info!("Both bots stopped");

    Ok(())
}

fn run_migrate() -> Result<()> {
    let database_path = config::database_path_from_env();
    create_pool(&database_path)?;
    log::info!("Database {} is up to date", database_path);
    Ok(())
}

fn run_export(format: ExportFormat, output: Option<&str>) -> Result<()> {
    let pool = create_pool(&config::database_path_from_env())?;
    let conn = get_connection(&pool)?;
    let all = participants::list_all(&conn)?;
    let content = export::render(&all, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("Exported {} participants to {}", all.len(), path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
