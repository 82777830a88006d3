use anyhow::Result;

use crate::llm::{extract, Generator};
use crate::models::UserProfile;
use crate::teacher::prompts;

/// Drops from `mastered_content` anything contradicted by the student's
/// recorded serious errors, replacing the list in full with the refined one.
///
/// Contract: with no recorded errors this is a no-op and the generation
/// service is never called. Extraction failure mutates nothing.
pub async fn clean_mastered(generator: &dyn Generator, profile: &mut UserProfile) -> Result<()> {
    if profile.lesson_errors.is_empty() || profile.mastered_content.is_empty() {
        return Ok(());
    }

    let cleaned = extract::try_text_to_list(
        generator,
        "Return the refined mastered-content list",
        &prompts::clean_mastered(profile),
    )
    .await?;

    log::info!(
        "🧹 Mastered content cleaned: {} -> {} items",
        profile.mastered_content.len(),
        cleaned.len()
    );
    profile.mastered_content = cleaned;
    Ok(())
}
