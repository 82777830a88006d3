use anyhow::{anyhow, Result};

use crate::llm::Generator;

const EXTRACTOR_SYSTEM_PROMPT: &str = "You are a succinct element extractor and format \
standardizer. Return a JSON array of strings inside a fenced ```json code block.";

/// Asks the generation service to turn free text into a list of strings.
///
/// The contract is strict: the response must carry a fenced ```json block
/// containing a JSON array of strings. Any anomaly (missing fence, parse
/// failure, transport error) is an error — callers decide whether that
/// aborts the step or degrades to an empty list.
pub async fn try_text_to_list(
    generator: &dyn Generator,
    prompt_intro: &str,
    text: &str,
) -> Result<Vec<String>> {
    let user_prompt = format!("{}: {}", prompt_intro, text);
    let raw = generator.generate(EXTRACTOR_SYSTEM_PROMPT, &user_prompt, &[]).await?;

    parse_fenced_list(&raw)
        .map_err(|e| anyhow!("list extraction parse failed: {}. Raw response: {}", e, raw))
}

/// Best-effort variant: any failure is logged and yields an empty list.
pub async fn text_to_list(generator: &dyn Generator, prompt_intro: &str, text: &str) -> Vec<String> {
    match try_text_to_list(generator, prompt_intro, text).await {
        Ok(items) => items,
        Err(e) => {
            log::error!("❌ {}", e);
            Vec::new()
        }
    }
}

/// Pulls the payload of a ```json fence and parses it as a string array.
fn parse_fenced_list(raw: &str) -> Result<Vec<String>, String> {
    let after_fence = raw
        .split_once("```json")
        .map(|(_, rest)| rest)
        .ok_or_else(|| "no ```json fence in response".to_string())?;
    let payload = after_fence
        .split_once("```")
        .map(|(body, _)| body)
        .ok_or_else(|| "unterminated ```json fence".to_string())?;

    serde_json::from_str::<Vec<String>>(payload.trim()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_array() {
        let raw = "Here you go:\n```json\n[\"greetings\", \"numbers 1-10\"]\n```\nDone.";
        assert_eq!(
            parse_fenced_list(raw).unwrap(),
            vec!["greetings".to_string(), "numbers 1-10".to_string()]
        );
    }

    #[test]
    fn rejects_missing_fence() {
        assert!(parse_fenced_list("[\"a\", \"b\"]").is_err());
    }

    #[test]
    fn rejects_unterminated_fence() {
        assert!(parse_fenced_list("```json\n[\"a\"]").is_err());
    }

    #[test]
    fn rejects_non_string_elements() {
        assert!(parse_fenced_list("```json\n[1, 2]\n```").is_err());
    }
}
