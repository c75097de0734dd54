//! Suggestion composition: candidate formatting, oracle call, enhancement

use std::sync::Arc;

use serde_json::json;
use serde_json::Value;

use crate::llm::extract_json;
use crate::llm::prompts;
use crate::llm::Extracted;
use crate::llm::LlmService;
use crate::models::ContactRecord;
use crate::models::NOT_AVAILABLE;
use crate::Result;

/// How many candidates are presented to the oracle.
const MAX_CANDIDATES: usize = 10;

/// Summary excerpt length in the candidate line.
const SUMMARY_EXCERPT_LEN: usize = 100;

/// Turns retrieved contacts into oracle-ranked suggestion objects.
pub struct SuggestionComposer {
    llm: Arc<LlmService>,
}

impl SuggestionComposer {
    pub fn new(llm: Arc<LlmService>) -> Self {
        Self { llm }
    }

    /// Ask the oracle for ranked suggestions over the matched contacts,
    /// then attach profile data from the matching contact records.
    ///
    /// A non-JSON completion is passed through as a raw string value so the
    /// caller still gets a response body.
    pub async fn compose(
        &self,
        mission: &str,
        matched_contacts: &[ContactRecord],
    ) -> Result<Value> {
        let lines = format_contacts_for_llm(matched_contacts);
        let prompt = prompts::suggestion_prompt(mission, &lines);
        let completion = self.llm.chat(&prompt, 800, 0.1).await?;

        match extract_json(&completion) {
            Extracted::Parsed(value) => Ok(enhance_suggestions(value, matched_contacts)),
            Extracted::Raw(text) => Ok(Value::String(text)),
        }
    }
}

/// Render candidate contacts as one pipe-delimited line each, capped at
/// [`MAX_CANDIDATES`]. Empty fields are omitted rather than shown blank.
#[must_use]
pub fn format_contacts_for_llm(contacts: &[ContactRecord]) -> Vec<String> {
    contacts
        .iter()
        .take(MAX_CANDIDATES)
        .map(|contact| {
            let headline = if contact.headline.is_empty() {
                NOT_AVAILABLE
            } else {
                &contact.headline
            };
            let mut line = format!("{}: {}", contact.full_name(), headline);

            if !contact.summary.is_empty() {
                let excerpt: String = contact.summary.chars().take(SUMMARY_EXCERPT_LEN).collect();
                line.push_str(&format!(" | Summary: {excerpt}..."));
            }
            if !contact.company.is_empty() {
                line.push_str(&format!(" | Company: {}", contact.company));
            }
            if !contact.current_company.is_empty() {
                line.push_str(&format!(" | Current Company: {}", contact.current_company));
            }
            if !contact.current_title.is_empty() {
                line.push_str(&format!(" | Current Title: {}", contact.current_title));
            }
            if !contact.location.is_empty() {
                line.push_str(&format!(" | Location: {}", contact.location));
            }
            if !contact.industry.is_empty() {
                line.push_str(&format!(" | Industry: {}", contact.industry));
            }

            line
        })
        .collect()
}

/// Attach linkedin_url, profile_summary, location and a connection strength
/// to each suggestion in an oracle-produced array.
///
/// Matching is by the suggested name appearing (case-insensitive) inside a
/// contact's full name; unmatched suggestions get empty profile fields.
/// Non-array values pass through untouched.
#[must_use]
pub fn enhance_suggestions(suggestions: Value, matched_contacts: &[ContactRecord]) -> Value {
    let Value::Array(items) = suggestions else {
        return suggestions;
    };

    let enhanced: Vec<Value> = items
        .into_iter()
        .map(|item| {
            let suggested_name = item
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_lowercase();

            let matching = matched_contacts
                .iter()
                .find(|c| !suggested_name.is_empty() && c.full_name().to_lowercase().contains(&suggested_name));

            let mut enhanced_item = item;
            if let Value::Object(map) = &mut enhanced_item {
                map.insert(
                    "linkedin_url".to_string(),
                    json!(matching.map_or("", |c| c.url.as_str())),
                );
                map.insert(
                    "profile_summary".to_string(),
                    json!(matching.map_or("", |c| c.summary.as_str())),
                );
                map.insert(
                    "location".to_string(),
                    json!(matching.map_or("", |c| c.location.as_str())),
                );
                map.insert("connection_strength".to_string(), json!("Medium"));
            }
            enhanced_item
        })
        .collect();

    Value::Array(enhanced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched_contact(first: &str, last: &str) -> ContactRecord {
        let slug = format!("{}-{}", first.to_lowercase(), last.to_lowercase());
        let mut contact = ContactRecord::basic(
            first,
            last,
            format!("https://www.linkedin.com/in/{slug}"),
            "",
            "Acme",
            "Engineer",
            "",
        );
        contact.enriched = true;
        contact.summary = "Scaling engineering organizations for a decade".to_string();
        contact.headline = "VP Engineering".to_string();
        contact.location = "Berlin, Germany".to_string();
        contact.industry = "Software".to_string();
        contact
    }

    #[test]
    fn test_format_includes_populated_fields_only() {
        let mut contact = enriched_contact("Jane", "Doe");
        contact.industry.clear();

        let lines = format_contacts_for_llm(&[contact]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Jane Doe: VP Engineering"));
        assert!(lines[0].contains("| Location: Berlin, Germany"));
        assert!(!lines[0].contains("Industry"));
    }

    #[test]
    fn test_format_truncates_long_summaries() {
        let mut contact = enriched_contact("Jane", "Doe");
        contact.summary = "x".repeat(300);

        let lines = format_contacts_for_llm(&[contact]);
        let expected = format!("Summary: {}...", "x".repeat(SUMMARY_EXCERPT_LEN));
        assert!(lines[0].contains(&expected));
    }

    #[test]
    fn test_format_caps_candidate_count() {
        let contacts: Vec<ContactRecord> = (0..15)
            .map(|i| enriched_contact("Contact", &i.to_string()))
            .collect();
        assert_eq!(format_contacts_for_llm(&contacts).len(), MAX_CANDIDATES);
    }

    #[test]
    fn test_enhance_attaches_profile_data() {
        let contacts = vec![enriched_contact("Jane", "Doe")];
        let suggestions = json!([{"name": "Jane Doe", "role": "VP Engineering"}]);

        let enhanced = enhance_suggestions(suggestions, &contacts);
        let first = &enhanced[0];
        assert_eq!(first["linkedin_url"], "https://www.linkedin.com/in/jane-doe");
        assert_eq!(first["location"], "Berlin, Germany");
        assert_eq!(first["connection_strength"], "Medium");
    }

    #[test]
    fn test_enhance_partial_name_match() {
        let contacts = vec![enriched_contact("Jane", "Doe")];
        let suggestions = json!([{"name": "jane"}]);

        let enhanced = enhance_suggestions(suggestions, &contacts);
        assert_eq!(enhanced[0]["linkedin_url"], "https://www.linkedin.com/in/jane-doe");
    }

    #[test]
    fn test_enhance_unmatched_suggestion_gets_empty_fields() {
        let contacts = vec![enriched_contact("Jane", "Doe")];
        let suggestions = json!([{"name": "Somebody Else"}]);

        let enhanced = enhance_suggestions(suggestions, &contacts);
        assert_eq!(enhanced[0]["linkedin_url"], "");
        assert_eq!(enhanced[0]["profile_summary"], "");
        assert_eq!(enhanced[0]["connection_strength"], "Medium");
    }

    #[test]
    fn test_enhance_passes_non_array_through() {
        let raw = Value::String("no suitable connections".to_string());
        assert_eq!(enhance_suggestions(raw.clone(), &[]), raw);
    }
}
