//! Core data types shared across the pipeline

use serde::Deserialize;
use serde::Serialize;

/// Shape every contact profile URL must have; anything else is never fetched.
pub const PROFILE_URL_PREFIX: &str = "https://www.linkedin.com/in/";

/// Sentinel used wherever an attribute has no usable text.
pub const NOT_AVAILABLE: &str = "N/A";

/// One contact, scoped to a user and keyed by its profile URL.
///
/// Basic fields come from the uploaded export and may be overwritten by later
/// uploads. Enrichment fields are populated exactly once by the enrichment
/// orchestrator and are never touched by uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactRecord {
    pub first_name: String,
    pub last_name: String,
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub connected_on: String,
    #[serde(default)]
    pub enriched: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub current_company: String,
    #[serde(default)]
    pub current_title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub company_size: String,
}

impl ContactRecord {
    /// Create an unenriched record from the basic upload fields.
    pub fn basic(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        url: impl Into<String>,
        email: impl Into<String>,
        company: impl Into<String>,
        position: impl Into<String>,
        connected_on: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            url: url.into(),
            email: email.into(),
            company: company.into(),
            position: position.into(),
            connected_on: connected_on.into(),
            enriched: false,
            summary: String::new(),
            headline: String::new(),
            current_company: String::new(),
            current_title: String::new(),
            location: String::new(),
            education: String::new(),
            industry: String::new(),
            company_size: String::new(),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Stable key inside the per-user vector collections: the URL with the
    /// profile prefix stripped. Empty when the URL has the wrong shape.
    #[must_use]
    pub fn contact_key(&self) -> &str {
        contact_key(&self.url)
    }
}

/// Derive the per-user collection key from a profile URL.
#[must_use]
pub fn contact_key(url: &str) -> &str {
    url.strip_prefix(PROFILE_URL_PREFIX)
        .unwrap_or("")
        .trim_end_matches('/')
}

/// Raw profile document returned by the enrichment data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub headline: String,
    /// Position history, most recent first.
    #[serde(default, rename = "position")]
    pub positions: Vec<RawPosition>,
    #[serde(default)]
    pub geo: RawGeo,
    #[serde(default)]
    pub educations: Vec<RawEducation>,
}

impl RawProfile {
    /// True when the document carries no usable data at all, as with a
    /// success response whose body is `{}`. Such documents count as a
    /// failed fetch so the contact stays eligible for re-enrichment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.headline.is_empty()
            && self.positions.is_empty()
            && self.geo.full.is_empty()
            && self.educations.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPosition {
    #[serde(default, rename = "companyName")]
    pub company_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "companyIndustry")]
    pub company_industry: String,
    #[serde(default, rename = "companyStaffCountRange")]
    pub company_staff_count_range: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGeo {
    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEducation {
    #[serde(default, rename = "schoolName")]
    pub school_name: String,
}

/// Per-user enrichment progress, held in memory for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentProgress {
    pub current: usize,
    pub total: usize,
    pub completed: bool,
    pub in_progress: bool,
}

impl Default for EnrichmentProgress {
    /// The idle state reported before any run has been scheduled.
    fn default() -> Self {
        Self {
            current: 0,
            total: 0,
            completed: true,
            in_progress: false,
        }
    }
}

/// Structured query attributes extracted from a free-text mission.
///
/// `summary` always carries the raw mission text; the other three are either
/// an extracted value or the [`NOT_AVAILABLE`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionAttributes {
    pub summary: String,
    pub position: String,
    pub location: String,
    pub industry: String,
}

impl MissionAttributes {
    /// Degraded-mode default: only the raw mission text is usable.
    #[must_use]
    pub fn fallback(mission: &str) -> Self {
        Self {
            summary: mission.to_string(),
            position: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            industry: NOT_AVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_key_strips_prefix() {
        assert_eq!(
            contact_key("https://www.linkedin.com/in/jane-doe-123/"),
            "jane-doe-123"
        );
        assert_eq!(contact_key("https://www.linkedin.com/in/jdoe"), "jdoe");
    }

    #[test]
    fn test_contact_key_rejects_wrong_shape() {
        assert_eq!(contact_key("https://example.com/in/jdoe"), "");
        assert_eq!(contact_key(""), "");
    }

    #[test]
    fn test_mission_attributes_fallback() {
        let attrs = MissionAttributes::fallback("find me a cofounder");
        assert_eq!(attrs.summary, "find me a cofounder");
        assert_eq!(attrs.position, NOT_AVAILABLE);
        assert_eq!(attrs.location, NOT_AVAILABLE);
        assert_eq!(attrs.industry, NOT_AVAILABLE);
    }

    #[test]
    fn test_raw_profile_empty_detection() {
        let raw: RawProfile = serde_json::from_str("{}").unwrap();
        assert!(raw.is_empty());

        let raw: RawProfile = serde_json::from_str(r#"{"headline": "CTO"}"#).unwrap();
        assert!(!raw.is_empty());
    }

    #[test]
    fn test_raw_profile_tolerates_missing_fields() {
        let raw: RawProfile = serde_json::from_str(r#"{"summary": "hi"}"#).unwrap();
        assert_eq!(raw.summary, "hi");
        assert!(raw.positions.is_empty());
        assert!(raw.geo.full.is_empty());
    }
}
