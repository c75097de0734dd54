//! Mission attribute extraction and cross-attribute score aggregation

use std::collections::HashMap;
use std::sync::Arc;

use tracing::error;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use super::ScoredContact;
use crate::config::SearchConfig;
use crate::database::AttributeHit;
use crate::database::Database;
use crate::embeddings::ContactAttribute;
use crate::embeddings::EmbeddingService;
use crate::llm::extract_json;
use crate::llm::prompts;
use crate::llm::Extracted;
use crate::llm::LlmService;
use crate::models::MissionAttributes;
use crate::models::NOT_AVAILABLE;
use crate::Result;

/// Retrieves contacts for a mission by querying each attribute collection
/// independently and summing weighted similarities per contact.
pub struct SemanticRetriever {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
    llm: Arc<LlmService>,
    config: SearchConfig,
}

impl SemanticRetriever {
    pub fn new(
        database: Arc<Database>,
        embedding_service: Arc<EmbeddingService>,
        llm: Arc<LlmService>,
        config: SearchConfig,
    ) -> Self {
        Self {
            database,
            embedding_service,
            llm,
            config,
        }
    }

    /// Pull structured position/location/industry attributes out of a
    /// free-text mission. Any oracle failure degrades to summary-only
    /// attributes rather than failing the search.
    pub async fn extract_mission_attributes(&self, mission: &str) -> MissionAttributes {
        let prompt = prompts::mission_attributes_prompt(mission);

        let completion = match self.llm.chat(&prompt, 200, 0.1).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Failed to extract mission attributes: {}", e);
                return MissionAttributes::fallback(mission);
            }
        };

        match extract_json(&completion) {
            Extracted::Parsed(value) => {
                let field = |key: &str| {
                    value
                        .get(key)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .unwrap_or(NOT_AVAILABLE)
                        .to_string()
                };
                MissionAttributes {
                    summary: mission.to_string(),
                    position: field("position"),
                    location: field("location"),
                    industry: field("industry"),
                }
            }
            Extracted::Raw(_) => {
                warn!("Mission attribute extraction returned non-JSON output");
                MissionAttributes::fallback(mission)
            }
        }
    }

    /// Rank a user's contacts against the mission attributes.
    ///
    /// Attributes holding the unavailable sentinel are skipped entirely;
    /// a contact absent from a queried collection simply contributes
    /// nothing from it. Per-attribute query failures are soft.
    pub async fn search(
        &self,
        user_id: Uuid,
        attributes: &MissionAttributes,
    ) -> Result<Vec<ScoredContact>> {
        let mut accumulator = ScoreAccumulator::new();

        for attribute in ContactAttribute::ALL {
            let query_text = attribute_query_text(attributes, attribute);
            if query_text == NOT_AVAILABLE {
                continue;
            }

            let hits = match self.query_one(user_id, attribute, query_text).await {
                Ok(hits) => hits,
                Err(e) => {
                    error!("Failed to search {} collection: {}", attribute, e);
                    continue;
                }
            };

            if hits.is_empty() {
                warn!("No results in {} collection for query: {}", attribute, query_text);
                continue;
            }

            let weight = self.attribute_weight(attribute);
            for hit in hits {
                accumulator.add(&hit, weight);
            }
        }

        let results = accumulator.into_top(self.config.n_results);
        info!(
            "Found {} top connections based on mission attributes",
            results.len()
        );
        Ok(results)
    }

    async fn query_one(
        &self,
        user_id: Uuid,
        attribute: ContactAttribute,
        query_text: &str,
    ) -> Result<Vec<AttributeHit>> {
        let query_embedding = self.embedding_service.generate(query_text).await?;
        self.database
            .query_attribute(user_id, attribute.as_str(), query_embedding)
            .await
    }

    fn attribute_weight(&self, attribute: ContactAttribute) -> f32 {
        match attribute {
            ContactAttribute::Summary => self.config.summary_weight,
            ContactAttribute::Position => self.config.position_weight,
            ContactAttribute::Location => self.config.location_weight,
            ContactAttribute::Industry => self.config.industry_weight,
        }
    }
}

fn attribute_query_text(attributes: &MissionAttributes, attribute: ContactAttribute) -> &str {
    match attribute {
        ContactAttribute::Summary => &attributes.summary,
        ContactAttribute::Position => &attributes.position,
        ContactAttribute::Location => &attributes.location,
        ContactAttribute::Industry => &attributes.industry,
    }
}

/// Accumulates weighted similarity per contact across attribute queries.
///
/// Ties in the final score break on first-contribution order, which the
/// insertion-ordered key list makes deterministic.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    scores: HashMap<String, ScoredContact>,
    order: Vec<String>,
}

impl ScoreAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one attribute hit into the running totals. Distances beyond 1.0
    /// clamp to zero similarity instead of penalizing the contact.
    pub fn add(&mut self, hit: &AttributeHit, weight: f32) {
        #[allow(clippy::cast_possible_truncation)]
        let similarity = (1.0 - hit.distance as f32).max(0.0) * weight;

        if let Some(entry) = self.scores.get_mut(&hit.contact_key) {
            entry.similarity_score += similarity;
        } else {
            self.order.push(hit.contact_key.clone());
            self.scores.insert(
                hit.contact_key.clone(),
                ScoredContact {
                    contact_key: hit.contact_key.clone(),
                    similarity_score: similarity,
                    name: hit.name.clone(),
                    company: hit.company.clone(),
                    url: hit.url.clone(),
                },
            );
        }
    }

    /// Drain into the top `n` contacts by descending aggregate score.
    #[must_use]
    pub fn into_top(mut self, n: usize) -> Vec<ScoredContact> {
        let mut results: Vec<ScoredContact> = self
            .order
            .iter()
            .filter_map(|key| self.scores.remove(key))
            .collect();

        // Stable sort keeps first-contribution order among equal scores.
        results.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(n);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(contact_key: &str, distance: f64) -> AttributeHit {
        AttributeHit {
            contact_key: contact_key.to_string(),
            name: format!("Name {contact_key}"),
            company: "Acme".to_string(),
            url: format!("https://www.linkedin.com/in/{contact_key}"),
            distance,
        }
    }

    #[test]
    fn test_scores_sum_across_attributes() {
        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(&hit("a", 0.2), 1.0);
        accumulator.add(&hit("a", 0.2), 1.0);

        let top = accumulator.into_top(10);
        assert_eq!(top.len(), 1);
        assert!((top[0].similarity_score - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_distance_contributes_zero() {
        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(&hit("a", 0.2), 1.0);
        // Distance beyond 1.0 must never subtract from the total.
        accumulator.add(&hit("a", 1.7), 1.0);

        let top = accumulator.into_top(10);
        assert!((top[0].similarity_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_weights_scale_contributions() {
        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(&hit("a", 0.5), 2.0);
        accumulator.add(&hit("b", 0.5), 1.0);

        let top = accumulator.into_top(10);
        assert_eq!(top[0].contact_key, "a");
        assert!((top[0].similarity_score - 1.0).abs() < 1e-6);
        assert!((top[1].similarity_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_top_n_sorted_descending_and_truncated() {
        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(&hit("low", 0.9), 1.0);
        accumulator.add(&hit("high", 0.1), 1.0);
        accumulator.add(&hit("mid", 0.5), 1.0);

        let top = accumulator.into_top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].contact_key, "high");
        assert_eq!(top[1].contact_key, "mid");
    }

    #[test]
    fn test_ties_break_on_first_contribution_order() {
        let mut accumulator = ScoreAccumulator::new();
        accumulator.add(&hit("first", 0.5), 1.0);
        accumulator.add(&hit("second", 0.5), 1.0);

        let top = accumulator.into_top(10);
        assert_eq!(top[0].contact_key, "first");
        assert_eq!(top[1].contact_key, "second");
    }

    #[test]
    fn test_metadata_taken_from_first_hit() {
        let mut accumulator = ScoreAccumulator::new();
        let mut first = hit("a", 0.3);
        first.company = "Globex".to_string();
        accumulator.add(&first, 1.0);
        accumulator.add(&hit("a", 0.4), 1.0);

        let top = accumulator.into_top(1);
        assert_eq!(top[0].company, "Globex");
    }
}
