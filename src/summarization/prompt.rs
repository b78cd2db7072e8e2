//! Prompt construction and input bounding for summary requests.

use super::record::SUMMARY_FIELDS;
use crate::extraction::char_prefix;

/// Maximum number of characters of article text submitted to the model.
pub const MAX_INPUT_CHARS: usize = 15_000;

/// Leading [`MAX_INPUT_CHARS`] characters of `text`.
pub fn truncate_input(text: &str) -> &str {
    char_prefix(text, MAX_INPUT_CHARS)
}

/// System instruction demanding a bare JSON object in the requested language.
pub fn system_instruction(language: &str) -> String {
    let template = SUMMARY_FIELDS
        .iter()
        .map(|field| format!("  \"{field}\": \"\""))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "You are an artificial intelligence research assistant. \
         Analyze the scientific article text you are given and produce a summary in {language}, \
         strictly and only as a JSON object in the format below. \
         Do not add any explanation, introduction or closing sentence. \
         Cover the article's purpose, method, dataset and results, \
         and explain how it differs from prior work in the literature.\n\n\
         Expected JSON format:\n{{\n{template}\n}}"
    )
}

/// User turn carrying the (already truncated) article text.
pub fn user_prompt(article_text: &str) -> String {
    format!("ARTICLE TEXT:\n{article_text}")
}
