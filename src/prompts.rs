//! Prompts sent to the translation model.
//!
//! Every request carries two messages: a system message that makes the model
//! a translator into the target language, and a user message with the chunk
//! text and its position in the document. Callers can replace the system
//! message through [`crate::config::TranslationConfig::system_prompt`]; the
//! user message is always built here.

/// Placeholder substituted in custom system prompts.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Default system prompt. `{language}` is replaced with the target language.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional translator. \
Translate the text you are given accurately into {language}. \
Output ONLY the translated text: no explanations, notes, greetings, or \
commentary, and no added Markdown or other formatting.";

/// Build the system message for a translation into `target_language`.
///
/// `custom` overrides the default template; `{language}` placeholders are
/// filled in either way. When `source_language` is known it is named too.
pub fn system_prompt(
    target_language: &str,
    source_language: Option<&str>,
    custom: Option<&str>,
) -> String {
    let template = custom.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let mut prompt = template.replace(LANGUAGE_PLACEHOLDER, target_language);
    if let Some(source) = source_language {
        prompt.push_str(&format!(" The source text is written in {source}."));
    }
    prompt
}

/// Build the user message for one chunk.
///
/// `position` is 1-based. It is only a hint so the model does not open a
/// middle chunk with an introduction or close it with a summary; ordering is
/// handled by the caller.
pub fn chunk_prompt(target_language: &str, position: usize, total: usize, chunk: &str) -> String {
    format!(
        "Translate the following text to {target_language}. \
This is part {position} of {total}. \
Keep the original formatting and line breaks, and do NOT add any introductory \
or concluding text:\n\n{chunk}"
    )
}
