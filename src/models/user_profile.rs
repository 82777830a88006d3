use std::collections::VecDeque;

use chrono::NaiveTime;

use crate::llm::config::ChatMessage;

/// The next input type expected from a user. Routes free text to the right
/// handler in `handlers::messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupStep {
    #[default]
    Idle,
    AwaitingLanguage,
    AwaitingLevel,
    AwaitingLessonPreference,
    AwaitingOptionalChoice,
    AwaitingLearnedLanguages,
    AwaitingMasteredContent,
    AwaitingLimitation,
    AwaitingReminderTime,
    SetupComplete,
    AwaitingQuestionText,
    AwaitingPersona,
    InConversation,
}

/// Everything the bot knows about one student, keyed by chat id.
/// Lives for the process lifetime only.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub language: String,
    pub level: String,
    pub limitation: String,
    pub learned_languages: Vec<String>,
    pub mastered_content: Vec<String>,
    pub seen_content: Vec<String>,
    pub lesson_errors: Vec<String>,
    pub next_lesson: String,
    /// Curriculum queue for the active lesson, consumed front-to-back.
    pub lesson_sections: VecDeque<String>,
    /// Reminder time of day, compared in UTC.
    pub reminder_time: Option<NaiveTime>,
    pub reminded_today: bool,
    pub current_step: SetupStep,
    /// Set once the setup chain reaches its terminal state, never cleared.
    pub setup_done: bool,
    /// When false, the current awaiting step was entered via a single-field
    /// command and the answer returns control instead of walking the chain.
    pub chained: bool,
    pub conversation_persona: Option<String>,
    /// Dialogue context for the active lesson, cleared on every new lesson.
    pub lesson_history: Vec<ChatMessage>,
}

impl UserProfile {
    /// Step to fall back to after a one-off answer, question, or conversation.
    pub fn resume_step(&self) -> SetupStep {
        if self.setup_done {
            SetupStep::SetupComplete
        } else {
            SetupStep::Idle
        }
    }
}
