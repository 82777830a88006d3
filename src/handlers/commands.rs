use std::error::Error;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ChatAction;

use crate::bot_state::BotState;
use crate::handlers::utils::{format_profile, send_replies};
use crate::handlers::SharedGenerator;
use crate::models::SetupStep;
use crate::teacher::{lesson, sequencer};
use crate::Command;

pub const RETRY_MSG: &str =
    "😵 Something went wrong while preparing that. Please send the command again.";

const HELP_TEXT: &str = "📚 Language teacher bot\n\n\
    Setup:\n\
    /setup — run the full course setup\n\
    /language — change the course language\n\
    /level — change your proficiency level\n\
    /limitation — change your limitation\n\
    /lesson — change the next lesson topic\n\
    /learned — update the languages you speak\n\
    /mastered — update the content you master\n\
    /reminder — set the daily reminder time\n\n\
    Lessons:\n\
    /new — start a new lesson\n\
    /next — serve the next section\n\
    /more — explain the last content in more depth\n\
    /better — explain the last content more simply\n\
    /question — ask a question about the last content\n\
    /conversation — practice in a roleplay conversation\n\
    /exit — leave the conversation\n\n\
    /data — show what I know about you\n\
    /help — this message";

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
    generator: SharedGenerator,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    let mut profile = state.get_profile(chat_id).await;

    // Commands that talk to the generation service get a typing indicator.
    if matches!(cmd, Command::New | Command::Next | Command::More | Command::Better) {
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    }

    let outcome: Result<Vec<String>> = match cmd {
        Command::Setup => Ok(sequencer::begin_setup(&mut profile)),
        Command::Language => Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingLanguage)),
        Command::Level => Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingLevel)),
        Command::Limitation => {
            Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingLimitation))
        }
        Command::Lesson => {
            Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingLessonPreference))
        }
        Command::Learned => {
            Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingLearnedLanguages))
        }
        Command::Mastered => {
            Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingMasteredContent))
        }
        Command::Reminder => {
            Ok(sequencer::begin_single(&mut profile, SetupStep::AwaitingReminderTime))
        }
        Command::New => lesson::start_lesson(&mut profile, generator.as_ref()).await,
        Command::Next => lesson::next_section(&mut profile, generator.as_ref()).await,
        Command::More => lesson::more_detail(&mut profile, generator.as_ref()).await,
        Command::Better => lesson::simplify(&mut profile, generator.as_ref()).await,
        Command::Question => Ok(lesson::begin_question(&mut profile)),
        Command::Conversation => Ok(lesson::begin_conversation(&mut profile)),
        Command::Exit => Ok(lesson::end_conversation(&mut profile)),
        Command::Data => Ok(vec![format_profile(&profile)]),
        Command::Help => Ok(vec![HELP_TEXT.to_string()]),
    };

    match outcome {
        Ok(messages) => {
            // Commit only after the whole command succeeded.
            state.save_profile(chat_id, profile).await;
            send_replies(&bot, chat_id, &messages).await?;
        }
        Err(e) => {
            log::error!("❌ Command {:?} failed for {}: {}", cmd, chat_id, e);
            bot.send_message(chat_id, RETRY_MSG).await?;
        }
    }
    Ok(())
}
