use anyhow::Result;
use chrono::NaiveTime;

use crate::llm::{extract, Generator};
use crate::models::{SetupStep, UserProfile};
use crate::teacher::{cleaner, prompts};

pub const SETUP_DONE_MSG: &str =
    "🎓 Setup complete! Send /new to start your first lesson, or /help for all commands.";

/// One row of the setup transition table.
pub struct SetupQuestion {
    pub step: SetupStep,
    pub prompt: &'static str,
    pub next: SetupStep,
}

/// The ordered setup chain. `AwaitingOptionalChoice` may jump straight to
/// `SetupComplete` when the user opts out of the bracketed questions.
pub const SETUP_CHAIN: &[SetupQuestion] = &[
    SetupQuestion {
        step: SetupStep::AwaitingLanguage,
        prompt: "🌍 What language do you want to learn?",
        next: SetupStep::AwaitingLevel,
    },
    SetupQuestion {
        step: SetupStep::AwaitingLevel,
        prompt: "📊 What is your proficiency level in that language?",
        next: SetupStep::AwaitingLessonPreference,
    },
    SetupQuestion {
        step: SetupStep::AwaitingLessonPreference,
        prompt: "📖 What do you want to learn about? Reply 'no' to start from the beginning.",
        next: SetupStep::AwaitingOptionalChoice,
    },
    SetupQuestion {
        step: SetupStep::AwaitingOptionalChoice,
        prompt: "🤔 A few optional questions would help me adapt lessons to you. \
                 Answer them now? (yes/no)",
        next: SetupStep::AwaitingLearnedLanguages,
    },
    SetupQuestion {
        step: SetupStep::AwaitingLearnedLanguages,
        prompt: "🗣 Which languages do you already speak?",
        next: SetupStep::AwaitingMasteredContent,
    },
    SetupQuestion {
        step: SetupStep::AwaitingMasteredContent,
        prompt: "✅ Which parts of the language do you already master?",
        next: SetupStep::AwaitingLimitation,
    },
    SetupQuestion {
        step: SetupStep::AwaitingLimitation,
        prompt: "🧩 Any limitation I should account for in lessons \
                 (e.g. dyslexia, audio only, small screen)?",
        next: SetupStep::AwaitingReminderTime,
    },
    SetupQuestion {
        step: SetupStep::AwaitingReminderTime,
        prompt: "⏰ At what time (HH:MM, UTC) should I send a daily study reminder? \
                 Reply 'no' to skip reminders.",
        next: SetupStep::SetupComplete,
    },
];

pub fn question_for(step: SetupStep) -> Option<&'static SetupQuestion> {
    SETUP_CHAIN.iter().find(|q| q.step == step)
}

/// `/setup`: restart the full chain from the first question.
pub fn begin_setup(profile: &mut UserProfile) -> Vec<String> {
    profile.current_step = SetupStep::AwaitingLanguage;
    profile.chained = true;
    vec![
        "👋 Let's set up your course. A few questions first.".to_string(),
        question_for(SetupStep::AwaitingLanguage)
            .map(|q| q.prompt.to_string())
            .unwrap_or_default(),
    ]
}

/// Single-field commands (`/language`, `/level`, ...) re-ask one question;
/// the answer returns control instead of walking the chain.
pub fn begin_single(profile: &mut UserProfile, step: SetupStep) -> Vec<String> {
    profile.current_step = step;
    profile.chained = false;
    match question_for(step) {
        Some(q) => vec![q.prompt.to_string()],
        None => vec!["⚠️ Unknown setup question.".to_string()],
    }
}

/// Handles the free-text answer to the current setup question: validate,
/// normalize through the generation service, commit, confirm, advance.
///
/// Validation failures re-prompt without touching state. A generation
/// failure propagates as `Err`; the caller discards the profile copy, so a
/// failed step commits nothing and the same question is asked again.
pub async fn handle_setup_reply(
    profile: &mut UserProfile,
    generator: &dyn Generator,
    text: &str,
) -> Result<Vec<String>> {
    let Some(question) = question_for(profile.current_step) else {
        return Ok(vec!["🤖 I wasn't expecting that. Send /help for commands.".to_string()]);
    };

    let text = text.trim();
    if text.is_empty() || text.starts_with('/') {
        return Ok(vec![
            "✋ I need a plain-text answer, not a command.".to_string(),
            question.prompt.to_string(),
        ]);
    }

    let confirmation = match profile.current_step {
        SetupStep::AwaitingLanguage => {
            let language = generator
                .generate(prompts::EXTRACTOR_SYSTEM, &prompts::language_summary(text), &[])
                .await?;
            profile.language = language.trim().to_string();
            format!("✅ Course language: {}", profile.language)
        }
        SetupStep::AwaitingLevel => {
            let level = generator
                .generate(prompts::EXTRACTOR_SYSTEM, &prompts::level_summary(text), &[])
                .await?;
            profile.level = level.trim().to_string();

            // Seed what the student should already know, then drop any
            // mastered content contradicted by recorded errors.
            let inferred = generator
                .generate(
                    "You are a succinct assistant.",
                    &prompts::infer_seen_content(&profile.level, &profile.language),
                    &[],
                )
                .await?;
            let seed =
                extract::text_to_list(generator, "Extract all listed elements", &inferred).await;
            if !seed.is_empty() {
                profile.seen_content = seed;
            }
            if let Err(e) = cleaner::clean_mastered(generator, profile).await {
                log::error!("❌ mastered-content cleaning failed: {}", e);
            }
            format!("✅ Level noted: {}", profile.level)
        }
        SetupStep::AwaitingLessonPreference => {
            let name = generator
                .generate(prompts::EXTRACTOR_SYSTEM, &prompts::lesson_name(text), &[])
                .await?;
            profile.next_lesson = name.trim().to_string();
            format!("✅ First lesson: {}", profile.next_lesson)
        }
        SetupStep::AwaitingOptionalChoice => {
            let wants_more = matches!(
                text.to_lowercase().as_str(),
                "yes" | "y" | "yes please" | "sure" | "ok" | "okay"
            );
            if !wants_more {
                profile.current_step = SetupStep::SetupComplete;
                profile.setup_done = true;
                return Ok(vec![
                    "👍 Skipping the optional questions.".to_string(),
                    SETUP_DONE_MSG.to_string(),
                ]);
            }
            "👍 A few more questions then.".to_string()
        }
        SetupStep::AwaitingLearnedLanguages => {
            let languages = extract::try_text_to_list(
                generator,
                "Extract all the languages listed and return them",
                text,
            )
            .await?;
            profile.learned_languages = languages;
            format!("✅ Known languages: {}", profile.learned_languages.join(", "))
        }
        SetupStep::AwaitingMasteredContent => {
            let mastered = extract::try_text_to_list(
                generator,
                "Extract all the language content topics listed and return them",
                text,
            )
            .await?;
            profile.mastered_content = mastered;
            format!("✅ Mastered content: {}", profile.mastered_content.join(", "))
        }
        SetupStep::AwaitingLimitation => {
            let limitation = generator
                .generate(prompts::EXTRACTOR_SYSTEM, &prompts::limitation_summary(text), &[])
                .await?;
            profile.limitation = limitation.trim().to_string();
            format!("✅ Limitation noted: {}", profile.limitation)
        }
        SetupStep::AwaitingReminderTime => {
            let lowered = text.to_lowercase();
            if lowered == "no" || lowered == "skip" || lowered == "none" {
                profile.reminder_time = None;
                "👍 No daily reminders.".to_string()
            } else {
                match NaiveTime::parse_from_str(text, "%H:%M") {
                    Ok(time) => {
                        profile.reminder_time = Some(time);
                        format!("⏰ Daily reminder set for {} UTC.", time.format("%H:%M"))
                    }
                    Err(_) => {
                        return Ok(vec![
                            "✋ I couldn't read that time. Use HH:MM (24h), e.g. 19:30, \
                             or reply 'no' to skip."
                                .to_string(),
                            question.prompt.to_string(),
                        ]);
                    }
                }
            }
        }
        _ => unreachable!("question_for only matches setup chain steps"),
    };

    let mut out = vec![confirmation];
    if profile.chained {
        profile.current_step = question.next;
        if question.next == SetupStep::SetupComplete {
            profile.setup_done = true;
            out.push(SETUP_DONE_MSG.to_string());
        } else if let Some(next) = question_for(question.next) {
            out.push(next.prompt.to_string());
        }
    } else {
        profile.current_step = profile.resume_step();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teacher::testkit::{fenced_list, ScriptedGenerator};

    fn chain_position(step: SetupStep) -> usize {
        SETUP_CHAIN.iter().position(|q| q.step == step).unwrap_or(SETUP_CHAIN.len())
    }

    #[tokio::test]
    async fn full_chain_advances_monotonically() {
        let mut profile = UserProfile::default();
        begin_setup(&mut profile);

        let generator = ScriptedGenerator::new(&[
            "Español (Spain)",                     // language summary
            "A1 beginner",                         // level summary
            "greetings and basic phrases",         // inferred seen content
            &fenced_list(&["greetings"]),          // seed extraction
            "Introduction: alphabet and pronunciation", // lesson name
            &fenced_list(&["English", "French"]),  // learned languages
            &fenced_list(&["the alphabet"]),       // mastered content
            "dyslexia, prefers short lines",       // limitation summary
        ]);

        let answers = [
            "Spanish",
            "total beginner",
            "no",
            "yes",
            "English and French",
            "I know the alphabet",
            "I'm dyslexic",
            "19:30",
        ];

        let mut last_pos = chain_position(profile.current_step);
        for answer in answers {
            handle_setup_reply(&mut profile, &generator, answer).await.unwrap();
            let pos = chain_position(profile.current_step);
            assert!(pos > last_pos, "step went backwards at answer {:?}", answer);
            last_pos = pos;
        }

        assert_eq!(profile.current_step, SetupStep::SetupComplete);
        assert!(profile.setup_done);
        assert_eq!(profile.language, "Español (Spain)");
        assert_eq!(profile.level, "A1 beginner");
        assert_eq!(profile.learned_languages, vec!["English", "French"]);
        assert_eq!(profile.mastered_content, vec!["the alphabet"]);
        assert_eq!(profile.reminder_time, Some(NaiveTime::from_hms_opt(19, 30, 0).unwrap()));
    }

    #[tokio::test]
    async fn opting_out_jumps_to_complete() {
        let mut profile = UserProfile::default();
        profile.current_step = SetupStep::AwaitingOptionalChoice;
        profile.chained = true;

        let generator = ScriptedGenerator::new(&[]);
        handle_setup_reply(&mut profile, &generator, "no thanks").await.unwrap();

        assert_eq!(profile.current_step, SetupStep::SetupComplete);
        assert!(profile.setup_done);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn spanish_beginner_scenario_seeds_seen_content() {
        let mut profile = UserProfile::default();
        begin_setup(&mut profile);
        assert_eq!(profile.current_step, SetupStep::AwaitingLanguage);

        let generator = ScriptedGenerator::new(&[
            "Español (Spanish)",
            "A1 beginner",
            "greetings, to be, numbers",
            &fenced_list(&["greetings", "verb 'to be'", "numbers 1-10"]),
        ]);

        handle_setup_reply(&mut profile, &generator, "Spanish").await.unwrap();
        assert!(profile.language.contains("Spanish"));
        assert_eq!(profile.current_step, SetupStep::AwaitingLevel);

        handle_setup_reply(&mut profile, &generator, "beginner").await.unwrap();
        assert_eq!(profile.level, "A1 beginner");
        assert_eq!(
            profile.seen_content,
            vec!["greetings", "verb 'to be'", "numbers 1-10"]
        );
        assert_eq!(profile.current_step, SetupStep::AwaitingLessonPreference);
    }

    #[tokio::test]
    async fn empty_input_reprompts_without_calls() {
        let mut profile = UserProfile::default();
        begin_setup(&mut profile);

        let generator = ScriptedGenerator::new(&[]);
        let out = handle_setup_reply(&mut profile, &generator, "   ").await.unwrap();

        assert_eq!(profile.current_step, SetupStep::AwaitingLanguage);
        assert!(profile.language.is_empty());
        assert_eq!(generator.call_count(), 0);
        assert!(out.iter().any(|m| m.contains("plain-text")));
    }

    #[tokio::test]
    async fn command_token_reprompts_without_calls() {
        let mut profile = UserProfile::default();
        begin_setup(&mut profile);

        let generator = ScriptedGenerator::new(&[]);
        handle_setup_reply(&mut profile, &generator, "/next").await.unwrap();

        assert_eq!(profile.current_step, SetupStep::AwaitingLanguage);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_failure_leaves_step_unchanged() {
        let mut profile = UserProfile::default();
        begin_setup(&mut profile);

        let generator = ScriptedGenerator::failing();
        let result = handle_setup_reply(&mut profile, &generator, "Spanish").await;

        assert!(result.is_err());
        assert_eq!(profile.current_step, SetupStep::AwaitingLanguage);
        assert!(profile.language.is_empty());
    }

    #[tokio::test]
    async fn invalid_reminder_time_reprompts() {
        let mut profile = UserProfile::default();
        profile.current_step = SetupStep::AwaitingReminderTime;
        profile.chained = true;

        let generator = ScriptedGenerator::new(&[]);
        handle_setup_reply(&mut profile, &generator, "half past nine").await.unwrap();

        assert_eq!(profile.current_step, SetupStep::AwaitingReminderTime);
        assert!(profile.reminder_time.is_none());
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn single_field_edit_returns_to_resume_step() {
        let mut profile = UserProfile::default();
        profile.setup_done = true;
        profile.current_step = SetupStep::SetupComplete;

        begin_single(&mut profile, SetupStep::AwaitingLanguage);
        assert_eq!(profile.current_step, SetupStep::AwaitingLanguage);

        let generator = ScriptedGenerator::new(&["Italiano"]);
        handle_setup_reply(&mut profile, &generator, "Italian").await.unwrap();

        assert_eq!(profile.language, "Italiano");
        assert_eq!(profile.current_step, SetupStep::SetupComplete);
    }
}
