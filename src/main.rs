use std::error::Error;
use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

mod bot_state;
mod config;
mod handlers;
mod llm;
mod models;
mod teacher;

use crate::bot_state::BotState;
use crate::config::BotConfig;
use crate::handlers::{command_handler, message_handler, SharedGenerator};
use crate::llm::OpenAiClient;

#[derive(BotCommands, Clone, Copy, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "run the full course setup")]
    Setup,
    #[command(description = "change the course language")]
    Language,
    #[command(description = "change your proficiency level")]
    Level,
    #[command(description = "change your limitation")]
    Limitation,
    #[command(description = "change the next lesson topic")]
    Lesson,
    #[command(description = "update the languages you speak")]
    Learned,
    #[command(description = "update the content you master")]
    Mastered,
    #[command(description = "set the daily reminder time")]
    Reminder,
    #[command(description = "start a new lesson")]
    New,
    #[command(description = "serve the next lesson section")]
    Next,
    #[command(description = "explain the last content in more depth")]
    More,
    #[command(description = "explain the last content more simply")]
    Better,
    #[command(description = "ask a question about the last content")]
    Question,
    #[command(description = "practice in a roleplay conversation")]
    Conversation,
    #[command(description = "leave the conversation")]
    Exit,
    #[command(description = "show what the bot knows about you")]
    Data,
    #[command(description = "show this help")]
    Help,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting language teacher bot...");

    // Missing credentials are fatal; nothing starts without them.
    let config = BotConfig::from_env()?;

    let generator: SharedGenerator = Arc::new(OpenAiClient::new(
        config.openai_api_key,
        config.openai_model,
        config.openai_api_base,
    ));
    let state = BotState::new();
    let bot = Bot::new(config.telegram_token);

    tokio::spawn(handlers::reminder_task(bot.clone(), state.clone(), generator.clone()));
    log::info!("⏰ Reminder task started");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, generator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
