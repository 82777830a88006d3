//! Prompt texts for the generation service. Wording kept close to the
//! curriculum the bot actually teaches; every call site pairs one of these
//! with the succinct-teacher or succinct-extractor system prompt.

use crate::models::UserProfile;

pub const EXTRACTOR_SYSTEM: &str = "You are a succinct extractor and format standardizer.";

pub fn teacher_system(profile: &UserProfile) -> String {
    format!(
        "You are a succinct foreign language teacher teaching a 1-on-1 {} class through a \
         text messaging app to your student (LEVEL: {}, LIMITATION: {}).",
        profile.language, profile.level, profile.limitation
    )
}

pub fn language_summary(answer: &str) -> String {
    format!(
        "This is the answer to the question 'what language do you want to learn?'. Output the \
         standard name of the language along with any necessary details like regional \
         specificities/level/register/etc. It must be written in said language. (use as few \
         words as possible to summarize all concepts): {}",
        answer
    )
}

pub fn level_summary(answer: &str) -> String {
    format!(
        "This is the answer to the question 'what is your language proficiency/level?'. Output \
         the standard name of the level along with any necessary details (use as few words as \
         possible to summarize all concepts): {}",
        answer
    )
}

pub fn limitation_summary(answer: &str) -> String {
    format!(
        "This is the answer to the question 'do you have any limitation or preference I should \
         account for in lessons?'. Output it as a short standardized description (use as few \
         words as possible to summarize all concepts): {}",
        answer
    )
}

pub fn lesson_name(answer: &str) -> String {
    format!(
        "This is the answer to the question 'about what do you want to learn?'. If it says 'no' \
         it means 'start from the beginning'. Output a curriculum lesson name that matches it \
         and any details specified (use as few words as possible to summarize all concepts): {}",
        answer
    )
}

pub fn infer_seen_content(level: &str, language: &str) -> String {
    format!(
        "Given a {} proficiency level in {}, make a list of all the content that a foreign \
         language student should already know.",
        level, language
    )
}

pub fn clean_mastered(profile: &UserProfile) -> String {
    format!(
        "A {} student has recently made these serious errors: {}. Out of the following list of \
         mastered content, keep only the items not contradicted by those errors and return the \
         remainder. Content seen so far: {}. Mastered content: {}",
        profile.language,
        profile.lesson_errors.join("; "),
        profile.seen_content.join("; "),
        profile.mastered_content.join("; ")
    )
}

pub fn segment_lesson(profile: &UserProfile) -> String {
    format!(
        "Divide the lesson '{}' of a {} course into a short ordered list of section topics, \
         from simplest to hardest. The student has already seen: {}. The student has mastered: \
         {}. Do not repeat mastered content.",
        profile.next_lesson,
        profile.language,
        profile.seen_content.join("; "),
        profile.mastered_content.join("; ")
    )
}

pub fn following_lesson(topic: &str, language: &str) -> String {
    format!(
        "Output the name of the curriculum lesson that naturally follows '{}' in a {} course \
         (use as few words as possible to summarize all concepts).",
        topic, language
    )
}

pub fn section_content(profile: &UserProfile, section: &str) -> String {
    format!(
        "You are teaching a {} class. The topic of this section is {}. Make a simple and clear \
         explanation of the topic and a schematic presentation of the content. The section's \
         new content must be in {}. Do not make practice exercises, someone else is in charge \
         of those.",
        profile.language, section, profile.language
    )
}

pub fn adapt_to_level(profile: &UserProfile, content: &str) -> String {
    format!(
        "Rewrite this section so its instructions and explanations are foreigner-friendly and \
         readable at a {} level. Do not write direct translations of the content; instead of \
         figures, add emojis and simple ASCII pictures to ease the semantic understanding by \
         illustrating concepts, actions, persons, etc. Section: {}",
        profile.level, content
    )
}

pub fn adapt_to_profile(profile: &UserProfile, content: &str) -> String {
    format!(
        "Adapt this section to the student: account for their limitation ({}), lean on the \
         languages they already speak ({}), skip over content they master ({}), and reinforce \
         their weak points ({}). Section: {}",
        profile.limitation,
        profile.learned_languages.join("; "),
        profile.mastered_content.join("; "),
        profile.lesson_errors.join("; "),
        content
    )
}

pub fn more_detail() -> String {
    "Explain the previous content again in more depth: expand the explanations, add examples \
     and edge cases, keep the same topic."
        .to_string()
}

pub fn simplify() -> String {
    "Explain the previous content again, but simpler: shorter sentences, fewer concepts at a \
     time, written so a 7 year old could read it."
        .to_string()
}

pub fn answer_question(question: &str) -> String {
    format!(
        "The student asks the following question about the last lesson content. Answer it with \
         direct reference to that content: {}",
        question
    )
}

pub fn conversation_opener(profile: &UserProfile, persona: &str) -> String {
    format!(
        "Start a casual conversation in {} with the student, roleplaying as {}. Open with one \
         or two short sentences suited to their level and invite a reply.",
        profile.language, persona
    )
}

pub fn conversation_turn(text: &str) -> String {
    format!(
        "Continue the roleplay conversation. Reply briefly to the student's message and keep \
         the conversation going: {}",
        text
    )
}

pub fn daily_reminder(profile: &UserProfile) -> String {
    format!(
        "Write a one or two sentence friendly reminder for a {} student of {} to do today's \
         study session. The upcoming lesson is '{}'.",
        profile.level, profile.language, profile.next_lesson
    )
}
