use anyhow::{anyhow, Result};

use crate::llm::config::ChatMessage;
use crate::llm::{extract, Generator};
use crate::models::{SetupStep, UserProfile};
use crate::teacher::prompts;

pub const NEED_SETUP_MSG: &str = "⚠️ Finish setup first — send /setup.";
pub const NEED_LESSON_MSG: &str = "⚠️ Start a lesson first — send /new.";
pub const LESSON_DONE_MSG: &str = "🏁 Lesson complete! Send /new to start the next one.";
pub const CONVERSATION_HINT_MSG: &str = "💬 Send /exit to leave the conversation.";

const DEFAULT_PERSONA: &str = "a friendly native speaker";

/// `/new`: build the section queue for the upcoming lesson, pre-compute the
/// one after it, and serve the first section. Nothing is committed unless
/// every generation call succeeds.
pub async fn start_lesson(
    profile: &mut UserProfile,
    generator: &dyn Generator,
) -> Result<Vec<String>> {
    if !profile.setup_done {
        return Ok(vec![NEED_SETUP_MSG.to_string()]);
    }

    let topic = profile.next_lesson.clone();
    let sections = extract::try_text_to_list(
        generator,
        "Extract the ordered section topics and return them",
        &prompts::segment_lesson(profile),
    )
    .await?;
    if sections.is_empty() {
        return Err(anyhow!("empty section list for lesson '{}'", topic));
    }
    let following = generator
        .generate(
            prompts::EXTRACTOR_SYSTEM,
            &prompts::following_lesson(&topic, &profile.language),
            &[],
        )
        .await?;

    profile.lesson_history.clear();
    profile.conversation_persona = None;
    profile.lesson_sections = sections.into();
    profile.seen_content.push(topic.clone());
    profile.next_lesson = following.trim().to_string();
    log::info!("📘 New lesson '{}' with {} sections", topic, profile.lesson_sections.len());

    let mut out = vec![format!(
        "📘 Lesson: {} ({} sections)",
        topic,
        profile.lesson_sections.len()
    )];
    out.extend(next_section(profile, generator).await?);
    Ok(out)
}

/// `/next`: consume the front section and run it through the fixed
/// three-stage pipeline (raw content, adapt to level, adapt to profile).
/// The section is only dequeued — and history only extended — after all
/// three stages succeed.
pub async fn next_section(
    profile: &mut UserProfile,
    generator: &dyn Generator,
) -> Result<Vec<String>> {
    if !profile.setup_done {
        return Ok(vec![NEED_SETUP_MSG.to_string()]);
    }
    let Some(section) = profile.lesson_sections.front().cloned() else {
        return Ok(vec![LESSON_DONE_MSG.to_string()]);
    };

    let system = prompts::teacher_system(profile);
    let raw = generator
        .generate(&system, &prompts::section_content(profile, &section), &profile.lesson_history)
        .await?;
    let leveled = generator
        .generate(&system, &prompts::adapt_to_level(profile, &raw), &profile.lesson_history)
        .await?;
    let adapted = generator
        .generate(&system, &prompts::adapt_to_profile(profile, &leveled), &profile.lesson_history)
        .await?;

    profile.lesson_sections.pop_front();
    profile.lesson_history.push(ChatMessage::user(format!("Next section: {}", section)));
    profile.lesson_history.push(ChatMessage::assistant(adapted.clone()));
    Ok(vec![adapted])
}

async fn refine(
    profile: &mut UserProfile,
    generator: &dyn Generator,
    instruction: String,
    marker: &str,
) -> Result<Vec<String>> {
    if profile.lesson_history.is_empty() {
        return Ok(vec![NEED_LESSON_MSG.to_string()]);
    }
    let system = prompts::teacher_system(profile);
    let content = generator.generate(&system, &instruction, &profile.lesson_history).await?;

    profile.lesson_history.push(ChatMessage::user(marker));
    profile.lesson_history.push(ChatMessage::assistant(content.clone()));
    Ok(vec![content])
}

/// `/more`: a deeper take on the previous content.
pub async fn more_detail(
    profile: &mut UserProfile,
    generator: &dyn Generator,
) -> Result<Vec<String>> {
    refine(profile, generator, prompts::more_detail(), "More detail, please.").await
}

/// `/better`: a simpler take on the previous content.
pub async fn simplify(
    profile: &mut UserProfile,
    generator: &dyn Generator,
) -> Result<Vec<String>> {
    refine(profile, generator, prompts::simplify(), "Explain it more simply, please.").await
}

/// `/question`, phase one: acknowledge and wait for the question text.
pub fn begin_question(profile: &mut UserProfile) -> Vec<String> {
    if profile.lesson_history.is_empty() {
        return vec![NEED_LESSON_MSG.to_string()];
    }
    profile.current_step = SetupStep::AwaitingQuestionText;
    vec!["❓ Sure — what is your question?".to_string()]
}

/// `/question`, phase two: answer with reference to the last lesson content.
pub async fn answer_question(
    profile: &mut UserProfile,
    generator: &dyn Generator,
    text: &str,
) -> Result<Vec<String>> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('/') {
        return Ok(vec!["✋ Type the question itself as plain text.".to_string()]);
    }

    let system = prompts::teacher_system(profile);
    let answer = generator
        .generate(&system, &prompts::answer_question(text), &profile.lesson_history)
        .await?;

    profile.lesson_history.push(ChatMessage::user(text));
    profile.lesson_history.push(ChatMessage::assistant(answer.clone()));
    profile.current_step = profile.resume_step();
    Ok(vec![answer])
}

/// `/conversation`, phase one: elicit an optional persona.
pub fn begin_conversation(profile: &mut UserProfile) -> Vec<String> {
    if profile.lesson_history.is_empty() {
        return vec![NEED_LESSON_MSG.to_string()];
    }
    profile.current_step = SetupStep::AwaitingPersona;
    vec!["🎭 Who should I roleplay as? Reply 'no' for a plain conversation.".to_string()]
}

/// `/conversation`, phase two: record the persona and open the exchange.
pub async fn open_conversation(
    profile: &mut UserProfile,
    generator: &dyn Generator,
    text: &str,
) -> Result<Vec<String>> {
    let text = text.trim();
    let persona = match text.to_lowercase().as_str() {
        "" | "no" | "none" | "skip" => None,
        _ if text.starts_with('/') => None,
        _ => Some(text.to_string()),
    };

    let system = prompts::teacher_system(profile);
    let opener = generator
        .generate(
            &system,
            &prompts::conversation_opener(profile, persona.as_deref().unwrap_or(DEFAULT_PERSONA)),
            &profile.lesson_history,
        )
        .await?;

    profile.conversation_persona = persona;
    profile.current_step = SetupStep::InConversation;
    profile.lesson_history.push(ChatMessage::user("Let's have a conversation."));
    profile.lesson_history.push(ChatMessage::assistant(opener.clone()));
    Ok(vec![opener, CONVERSATION_HINT_MSG.to_string()])
}

/// Conversation mode: every inbound message produces one follow-up turn.
pub async fn conversation_turn(
    profile: &mut UserProfile,
    generator: &dyn Generator,
    text: &str,
) -> Result<Vec<String>> {
    let system = prompts::teacher_system(profile);
    let reply = generator
        .generate(&system, &prompts::conversation_turn(text), &profile.lesson_history)
        .await?;

    profile.lesson_history.push(ChatMessage::user(text));
    profile.lesson_history.push(ChatMessage::assistant(reply.clone()));
    Ok(vec![reply])
}

/// `/exit`: leave conversation mode and return to lesson commands.
pub fn end_conversation(profile: &mut UserProfile) -> Vec<String> {
    if !matches!(profile.current_step, SetupStep::InConversation | SetupStep::AwaitingPersona) {
        return vec!["🤷 No active conversation to leave.".to_string()];
    }
    profile.current_step = profile.resume_step();
    profile.conversation_persona = None;
    vec![
        "👋 Conversation over — back to lesson commands (/next, /more, /better, /question)."
            .to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teacher::testkit::{fenced_list, ScriptedGenerator};

    fn ready_profile() -> UserProfile {
        UserProfile {
            language: "Español".to_string(),
            level: "A1 beginner".to_string(),
            limitation: "none".to_string(),
            next_lesson: "Greetings".to_string(),
            setup_done: true,
            current_step: SetupStep::SetupComplete,
            ..UserProfile::default()
        }
    }

    fn profile_with_sections(sections: &[&str]) -> UserProfile {
        let mut profile = ready_profile();
        profile.lesson_sections = sections.iter().map(|s| s.to_string()).collect();
        profile
    }

    #[tokio::test]
    async fn new_lesson_requires_setup() {
        let mut profile = UserProfile::default();
        let generator = ScriptedGenerator::new(&[]);

        let out = start_lesson(&mut profile, &generator).await.unwrap();

        assert_eq!(out, vec![NEED_SETUP_MSG.to_string()]);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn new_lesson_builds_queue_and_serves_first_section() {
        let mut profile = ready_profile();
        let generator = ScriptedGenerator::new(&[
            &fenced_list(&["hello/goodbye", "formal greetings", "introducing yourself"]),
            "Numbers 1-20",       // pre-computed following lesson
            "raw content",        // pipeline stage 1
            "leveled content",    // stage 2
            "adapted content",    // stage 3
        ]);

        let out = start_lesson(&mut profile, &generator).await.unwrap();

        assert_eq!(profile.lesson_sections.len(), 2);
        assert_eq!(profile.next_lesson, "Numbers 1-20");
        assert_eq!(profile.seen_content, vec!["Greetings"]);
        assert_eq!(profile.lesson_history.len(), 2);
        assert!(out.last().unwrap().contains("adapted content"));
    }

    #[tokio::test]
    async fn queue_shrinks_by_one_per_section_and_stops_at_empty() {
        let mut profile = profile_with_sections(&["a", "b", "c"]);

        for expected_len in [2usize, 1, 0] {
            let generator = ScriptedGenerator::new(&["raw", "leveled", "adapted"]);
            next_section(&mut profile, &generator).await.unwrap();
            assert_eq!(profile.lesson_sections.len(), expected_len);
            assert_eq!(generator.call_count(), 3);
        }

        // Fourth call: completion notice, no generation, queue untouched.
        let generator = ScriptedGenerator::new(&[]);
        let out = next_section(&mut profile, &generator).await.unwrap();
        assert_eq!(out, vec![LESSON_DONE_MSG.to_string()]);
        assert_eq!(generator.call_count(), 0);
        assert!(profile.lesson_sections.is_empty());
    }

    #[tokio::test]
    async fn pipeline_failure_leaves_queue_and_history_untouched() {
        let mut profile = profile_with_sections(&["a", "b"]);
        // Stage 1 succeeds, stage 2 fails (script exhausted).
        let generator = ScriptedGenerator::new(&["raw"]);

        let result = next_section(&mut profile, &generator).await;

        assert!(result.is_err());
        assert_eq!(profile.lesson_sections.len(), 2);
        assert!(profile.lesson_history.is_empty());
    }

    #[tokio::test]
    async fn side_commands_require_lesson_history() {
        let mut profile = ready_profile();
        let generator = ScriptedGenerator::new(&[]);

        let out = more_detail(&mut profile, &generator).await.unwrap();
        assert_eq!(out, vec![NEED_LESSON_MSG.to_string()]);
        let out = simplify(&mut profile, &generator).await.unwrap();
        assert_eq!(out, vec![NEED_LESSON_MSG.to_string()]);
        let out = begin_question(&mut profile);
        assert_eq!(out, vec![NEED_LESSON_MSG.to_string()]);
        let out = begin_conversation(&mut profile);
        assert_eq!(out, vec![NEED_LESSON_MSG.to_string()]);

        assert_eq!(generator.call_count(), 0);
        assert_eq!(profile.current_step, SetupStep::SetupComplete);
    }

    #[tokio::test]
    async fn refinement_appends_to_history_on_success() {
        let mut profile = profile_with_sections(&[]);
        profile.lesson_history.push(ChatMessage::assistant("previous content"));

        let generator = ScriptedGenerator::new(&["deeper content"]);
        let out = more_detail(&mut profile, &generator).await.unwrap();

        assert_eq!(out, vec!["deeper content".to_string()]);
        assert_eq!(profile.lesson_history.len(), 3);
    }

    #[tokio::test]
    async fn refinement_failure_does_not_mutate_history() {
        let mut profile = profile_with_sections(&[]);
        profile.lesson_history.push(ChatMessage::assistant("previous content"));

        let generator = ScriptedGenerator::failing();
        let result = simplify(&mut profile, &generator).await;

        assert!(result.is_err());
        assert_eq!(profile.lesson_history.len(), 1);
    }

    #[tokio::test]
    async fn question_flow_answers_and_resumes() {
        let mut profile = profile_with_sections(&[]);
        profile.lesson_history.push(ChatMessage::assistant("previous content"));

        begin_question(&mut profile);
        assert_eq!(profile.current_step, SetupStep::AwaitingQuestionText);

        let generator = ScriptedGenerator::new(&["the answer"]);
        let out = answer_question(&mut profile, &generator, "why the accent?").await.unwrap();

        assert_eq!(out, vec!["the answer".to_string()]);
        assert_eq!(profile.current_step, SetupStep::SetupComplete);
        assert_eq!(profile.lesson_history.len(), 3);
    }

    #[tokio::test]
    async fn conversation_flow_roundtrip() {
        let mut profile = profile_with_sections(&[]);
        profile.lesson_history.push(ChatMessage::assistant("previous content"));

        begin_conversation(&mut profile);
        assert_eq!(profile.current_step, SetupStep::AwaitingPersona);

        let generator = ScriptedGenerator::new(&["¡Hola! ¿Qué tal?", "Muy bien."]);
        open_conversation(&mut profile, &generator, "a waiter in Madrid").await.unwrap();
        assert_eq!(profile.current_step, SetupStep::InConversation);
        assert_eq!(profile.conversation_persona.as_deref(), Some("a waiter in Madrid"));

        conversation_turn(&mut profile, &generator, "Hola, una mesa por favor").await.unwrap();

        let out = end_conversation(&mut profile);
        assert_eq!(profile.current_step, SetupStep::SetupComplete);
        assert!(profile.conversation_persona.is_none());
        assert!(out[0].contains("Conversation over"));
    }

    #[tokio::test]
    async fn persona_failure_keeps_awaiting_persona() {
        let mut profile = profile_with_sections(&[]);
        profile.lesson_history.push(ChatMessage::assistant("previous content"));
        begin_conversation(&mut profile);

        let generator = ScriptedGenerator::failing();
        let result = open_conversation(&mut profile, &generator, "a pirate").await;

        assert!(result.is_err());
        assert_eq!(profile.current_step, SetupStep::AwaitingPersona);
        assert!(profile.conversation_persona.is_none());
        assert_eq!(profile.lesson_history.len(), 1);
    }
}
