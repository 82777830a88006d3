use std::error::Error;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ChatAction;

use crate::bot_state::BotState;
use crate::handlers::commands::RETRY_MSG;
use crate::handlers::utils::send_replies;
use crate::handlers::SharedGenerator;
use crate::models::SetupStep;
use crate::teacher::{lesson, sequencer};

/// Routes free text by the user's current step: setup answers go to the
/// sequencer, lesson phases to the lesson driver, everything else gets a
/// nudge toward the right command.
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
    generator: SharedGenerator,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, "✋ I can only read text messages.").await?;
        return Ok(());
    };
    // Known commands are claimed by the command branch; unknown ones are
    // not free-text answers either.
    if text.starts_with('/') {
        bot.send_message(chat_id, "🤔 Unknown command. Send /help for the list.").await?;
        return Ok(());
    }

    let mut profile = state.get_profile(chat_id).await;

    let expects_generation = !matches!(profile.current_step, SetupStep::Idle | SetupStep::SetupComplete);
    if expects_generation {
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    }

    let outcome: Result<Vec<String>> = match profile.current_step {
        SetupStep::Idle => Ok(vec![
            "👋 Hi! I'm your language teacher. Send /setup to build your course.".to_string(),
        ]),
        SetupStep::AwaitingLanguage
        | SetupStep::AwaitingLevel
        | SetupStep::AwaitingLessonPreference
        | SetupStep::AwaitingOptionalChoice
        | SetupStep::AwaitingLearnedLanguages
        | SetupStep::AwaitingMasteredContent
        | SetupStep::AwaitingLimitation
        | SetupStep::AwaitingReminderTime => {
            sequencer::handle_setup_reply(&mut profile, generator.as_ref(), text).await
        }
        SetupStep::SetupComplete => Ok(vec![
            "📚 Setup is done. Send /new for a lesson, /next for the next section, \
             or /help for all commands."
                .to_string(),
        ]),
        SetupStep::AwaitingQuestionText => {
            lesson::answer_question(&mut profile, generator.as_ref(), text).await
        }
        SetupStep::AwaitingPersona => {
            lesson::open_conversation(&mut profile, generator.as_ref(), text).await
        }
        SetupStep::InConversation => {
            lesson::conversation_turn(&mut profile, generator.as_ref(), text).await
        }
    };

    match outcome {
        Ok(messages) => {
            state.save_profile(chat_id, profile).await;
            send_replies(&bot, chat_id, &messages).await?;
        }
        // The profile copy is dropped: a failed step commits nothing and
        // the same question handles the next attempt.
        Err(e) => {
            log::error!("❌ Step {:?} failed for {}: {}", profile.current_step, chat_id, e);
            bot.send_message(chat_id, RETRY_MSG).await?;
        }
    }
    Ok(())
}
