//! Pure merge of a raw profile document into a contact record

use crate::models::ContactRecord;
use crate::models::RawProfile;

/// How many schools make it into the education summary.
const MAX_SCHOOLS: usize = 2;

/// Merge a fetched profile document into a contact record.
///
/// With no document, or a document carrying no data, the base record is
/// returned unchanged (still unenriched). Otherwise the enrichment fields
/// are populated, falling back to the base record's company/position where
/// the document is silent.
#[must_use]
pub fn format_enriched(base: &ContactRecord, raw: Option<RawProfile>) -> ContactRecord {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return base.clone();
    };

    let current_position = raw.positions.first();

    let headline = if raw.headline.is_empty() {
        base.position.clone()
    } else {
        raw.headline
    };

    let current_company = current_position
        .filter(|p| !p.company_name.is_empty())
        .map_or_else(|| base.company.clone(), |p| p.company_name.clone());

    let current_title = current_position
        .filter(|p| !p.title.is_empty())
        .map_or_else(|| base.position.clone(), |p| p.title.clone());

    let education = raw
        .educations
        .iter()
        .filter(|e| !e.school_name.is_empty())
        .take(MAX_SCHOOLS)
        .map(|e| e.school_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    ContactRecord {
        enriched: true,
        summary: raw.summary,
        headline,
        current_company,
        current_title,
        location: raw.geo.full,
        education,
        industry: current_position.map_or_else(String::new, |p| p.company_industry.clone()),
        company_size: current_position
            .map_or_else(String::new, |p| p.company_staff_count_range.clone()),
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawEducation;
    use crate::models::RawGeo;
    use crate::models::RawPosition;

    fn base() -> ContactRecord {
        ContactRecord::basic(
            "Jane",
            "Doe",
            "https://www.linkedin.com/in/jane-doe",
            "jane@example.com",
            "Acme",
            "Engineer",
            "01 Jan 2024",
        )
    }

    fn raw() -> RawProfile {
        RawProfile {
            summary: "20 years in infrastructure".to_string(),
            headline: "VP Engineering".to_string(),
            positions: vec![
                RawPosition {
                    company_name: "Globex".to_string(),
                    title: "VP Engineering".to_string(),
                    company_industry: "Software".to_string(),
                    company_staff_count_range: "201-500".to_string(),
                },
                RawPosition {
                    company_name: "Initech".to_string(),
                    title: "Engineer".to_string(),
                    ..RawPosition::default()
                },
            ],
            geo: RawGeo {
                full: "Austin, Texas, United States".to_string(),
            },
            educations: vec![
                RawEducation {
                    school_name: "MIT".to_string(),
                },
                RawEducation {
                    school_name: "Stanford".to_string(),
                },
                RawEducation {
                    school_name: "Unlisted Third".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_none_leaves_record_unchanged() {
        let base = base();
        let formatted = format_enriched(&base, None);
        assert_eq!(formatted, base);
        assert!(!formatted.enriched);
    }

    #[test]
    fn test_empty_document_leaves_record_unenriched() {
        let base = base();
        // A 200 response with body {} deserializes to a default document.
        let formatted = format_enriched(&base, Some(RawProfile::default()));
        assert_eq!(formatted, base);
        assert!(!formatted.enriched);
    }

    #[test]
    fn test_full_document_populates_enrichment_fields() {
        let formatted = format_enriched(&base(), Some(raw()));
        assert!(formatted.enriched);
        assert_eq!(formatted.summary, "20 years in infrastructure");
        assert_eq!(formatted.headline, "VP Engineering");
        assert_eq!(formatted.current_company, "Globex");
        assert_eq!(formatted.current_title, "VP Engineering");
        assert_eq!(formatted.location, "Austin, Texas, United States");
        assert_eq!(formatted.education, "MIT, Stanford");
        assert_eq!(formatted.industry, "Software");
        assert_eq!(formatted.company_size, "201-500");
        // Basic fields are untouched.
        assert_eq!(formatted.company, "Acme");
        assert_eq!(formatted.position, "Engineer");
    }

    #[test]
    fn test_missing_fields_fall_back_to_base() {
        let mut document = raw();
        document.headline.clear();
        document.positions.clear();

        let formatted = format_enriched(&base(), Some(document));
        assert_eq!(formatted.headline, "Engineer");
        assert_eq!(formatted.current_company, "Acme");
        assert_eq!(formatted.current_title, "Engineer");
        assert_eq!(formatted.industry, "");
        assert_eq!(formatted.company_size, "");
    }

    #[test]
    fn test_education_skips_unnamed_schools() {
        let mut document = raw();
        document.educations.insert(0, RawEducation::default());

        let formatted = format_enriched(&base(), Some(document));
        assert_eq!(formatted.education, "MIT, Stanford");
    }
}
