use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::models::UserProfile;

/// Normalizes generated text for the Telegram renderer: HTML tags become
/// Markdown, runs of blank lines collapse, and overlong messages are cut
/// under the 4096-character message limit.
pub fn clean_telegram_markdown(text: &str) -> String {
    let mut cleaned = text.to_string();

    cleaned = cleaned.replace("<b>", "*").replace("</b>", "*");
    cleaned = cleaned.replace("<strong>", "*").replace("</strong>", "*");
    cleaned = cleaned.replace("<i>", "_").replace("</i>", "_");
    cleaned = cleaned.replace("<em>", "_").replace("</em>", "_");
    cleaned = cleaned.replace("<br>", "\n").replace("<br/>", "\n").replace("<br />", "\n");
    cleaned = cleaned.replace("<p>", "\n").replace("</p>", "\n");
    cleaned = cleaned.replace("<u>", "").replace("</u>", "");
    cleaned = cleaned.replace("<s>", "").replace("</s>", "");
    cleaned = cleaned.replace("<code>", "`").replace("</code>", "`");
    cleaned = cleaned.replace("<pre>", "```\n").replace("</pre>", "\n```");

    while cleaned.contains("\n\n\n") {
        cleaned = cleaned.replace("\n\n\n", "\n\n");
    }

    if cleaned.chars().count() > 3800 {
        cleaned = cleaned.chars().take(3800).collect();
        cleaned.push_str("\n\n[message truncated]");
    }

    cleaned
}

/// Sends a batch of outbound messages. Generated content goes out as
/// Markdown; if Telegram rejects the formatting, the text is resent plain
/// rather than dropped.
pub async fn send_replies(
    bot: &Bot,
    chat_id: ChatId,
    messages: &[String],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    for message in messages {
        let cleaned = clean_telegram_markdown(message);
        let markdown = bot
            .send_message(chat_id, &cleaned)
            .parse_mode(ParseMode::Markdown)
            .await;
        if markdown.is_err() {
            bot.send_message(chat_id, &cleaned).await?;
        }
    }
    Ok(())
}

/// `/data`: the collected profile, rendered for the user.
pub fn format_profile(profile: &UserProfile) -> String {
    let reminder = match profile.reminder_time {
        Some(time) => format!("{} UTC", time.format("%H:%M")),
        None => "off".to_string(),
    };
    format!(
        "📋 Your data\n\
         Language: {}\n\
         Level: {}\n\
         Limitation: {}\n\
         Known languages: {}\n\
         Mastered content: {}\n\
         Seen content: {}\n\
         Next lesson: {}\n\
         Sections queued: {}\n\
         Daily reminder: {}",
        profile.language,
        profile.level,
        profile.limitation,
        profile.learned_languages.join(", "),
        profile.mastered_content.join(", "),
        profile.seen_content.join(", "),
        profile.next_lesson,
        profile.lesson_sections.len(),
        reminder
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_tags_become_markdown() {
        let cleaned = clean_telegram_markdown("<b>hola</b> <i>mundo</i><br>done");
        assert_eq!(cleaned, "*hola* _mundo_\ndone");
    }

    #[test]
    fn overlong_messages_are_truncated() {
        let long = "x".repeat(5000);
        let cleaned = clean_telegram_markdown(&long);
        assert!(cleaned.chars().count() < 4000);
        assert!(cleaned.ends_with("[message truncated]"));
    }

    #[test]
    fn profile_rendering_shows_reminder_state() {
        let profile = UserProfile::default();
        assert!(format_profile(&profile).contains("Daily reminder: off"));
    }
}
