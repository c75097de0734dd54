//! Lenient JSON extraction from model output

use serde_json::Value;

/// Outcome of parsing a model completion that was asked for JSON.
///
/// Models do not always comply, so the raw text is preserved as a degraded
/// result rather than treated as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Parsed(Value),
    Raw(String),
}

impl Extracted {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}

/// Parse a completion as JSON, tolerating markdown code fences.
///
/// Tries the whole text first, then the content of the first fenced block
/// (with or without a `json` language tag). Anything else comes back as
/// `Raw` text verbatim.
#[must_use]
pub fn extract_json(text: &str) -> Extracted {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Extracted::Parsed(value);
    }

    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return Extracted::Parsed(value);
        }
    }

    Extracted::Raw(text.to_string())
}

/// Content of the first ``` fenced block, language tag stripped.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let end = after_fence.find("```")?;
    let mut inner = &after_fence[..end];

    if let Some(rest) = inner.strip_prefix("json") {
        inner = rest;
    }
    Some(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_json_object() {
        let extracted = extract_json(r#"{"position": "CTO", "location": "Berlin"}"#);
        assert_eq!(
            extracted,
            Extracted::Parsed(json!({"position": "CTO", "location": "Berlin"}))
        );
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let text = "Here you go:\n```json\n[{\"name\": \"Jane Doe\"}]\n```\nHope that helps.";
        assert_eq!(extract_json(text), Extracted::Parsed(json!([{"name": "Jane Doe"}])));
    }

    #[test]
    fn test_fenced_block_without_language_tag() {
        let text = "```\n{\"industry\": \"N/A\"}\n```";
        assert_eq!(extract_json(text), Extracted::Parsed(json!({"industry": "N/A"})));
    }

    #[test]
    fn test_prose_falls_back_to_raw() {
        let text = "I could not find any suitable connections.";
        assert_eq!(extract_json(text), Extracted::Raw(text.to_string()));
    }

    #[test]
    fn test_malformed_fenced_json_falls_back_to_raw() {
        let text = "```json\n{not json}\n```";
        assert_eq!(extract_json(text), Extracted::Raw(text.to_string()));
    }
}
