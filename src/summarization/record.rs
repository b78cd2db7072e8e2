//! Typed summary schema and the parse-then-validate step for raw model output.

use super::SummarizationError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Field names of [`SummaryRecord`], in the order the model is asked to emit them.
pub const SUMMARY_FIELDS: [&str; 5] = [
    "veri_seti",
    "metodoloji",
    "sonuclar",
    "kategori",
    "ozet_genel",
];

/// Structured summary of a research article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryRecord {
    /// Short description of the dataset used in the study: its name, size and source.
    pub veri_seti: String,
    /// Brief account of the core method, algorithm and novel approach applied.
    pub metodoloji: String,
    /// The most important findings, metrics and conclusions.
    pub sonuclar: String,
    /// A single word naming the article's main topic (for example NLP, CV, RL, Hardware, Theory).
    pub kategori: String,
    /// A standard 3-4 sentence summary covering the article's aim, method and results.
    pub ozet_genel: String,
}

/// Remove a surrounding markdown code fence, with or without a language tag.
///
/// Leading and trailing fences are handled independently, so a response that only opens
/// or only closes a fence is still unwrapped. Text without fences is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let tag_end = rest
            .find(|c: char| c.is_whitespace() || c == '{' || c == '[')
            .unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        body = if tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            &rest[tag_end..]
        } else {
            rest
        };
    }

    body = body.trim();
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Strip fences, parse JSON, and validate the result against [`SummaryRecord`].
pub fn parse_summary(raw: &str) -> Result<SummaryRecord, SummarizationError> {
    let payload = strip_code_fences(raw);
    let value: Value = serde_json::from_str(payload).map_err(SummarizationError::MalformedJson)?;
    validate_summary(value)
}

/// Check that every required field is present as a string, then build the typed record.
///
/// Extra fields are ignored. Missing, null, and non-string fields are all reported together.
pub fn validate_summary(value: Value) -> Result<SummaryRecord, SummarizationError> {
    let Some(object) = value.as_object() else {
        return Err(SummarizationError::SchemaViolation(format!(
            "expected a JSON object, found {}",
            json_kind(&value)
        )));
    };

    let problems: Vec<String> = SUMMARY_FIELDS
        .iter()
        .filter_map(|field| match object.get(*field) {
            Some(Value::String(_)) => None,
            None | Some(Value::Null) => Some(format!("`{field}` is missing")),
            Some(other) => Some(format!(
                "`{field}` must be a string, found {}",
                json_kind(other)
            )),
        })
        .collect();

    if !problems.is_empty() {
        return Err(SummarizationError::SchemaViolation(problems.join("; ")));
    }

    serde_json::from_value(value)
        .map_err(|error| SummarizationError::SchemaViolation(error.to_string()))
}

/// Response schema in the subset accepted by Gemini's schema-constrained JSON mode.
///
/// Field descriptions come from the [`SummaryRecord`] doc comments.
pub fn response_schema() -> Value {
    let generated = serde_json::to_value(schemars::schema_for!(SummaryRecord)).unwrap_or_default();
    let descriptions = generated.get("properties").and_then(Value::as_object);

    let properties: Map<String, Value> = SUMMARY_FIELDS
        .iter()
        .map(|field| {
            let mut property = Map::new();
            property.insert("type".into(), Value::String("STRING".into()));
            if let Some(description) = descriptions
                .and_then(|props| props.get(*field))
                .and_then(|schema| schema.get("description"))
                .and_then(Value::as_str)
            {
                property.insert("description".into(), Value::String(description.into()));
            }
            (field.to_string(), Value::Object(property))
        })
        .collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": SUMMARY_FIELDS,
        "propertyOrdering": SUMMARY_FIELDS,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
