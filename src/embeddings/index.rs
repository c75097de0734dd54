//! Embedding Index Manager: four per-attribute vector collections per user

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use uuid::Uuid;

use super::ContactAttribute;
use super::EmbeddingService;
use crate::database::Database;
use crate::models::ContactRecord;
use crate::models::NOT_AVAILABLE;
use crate::Result;

/// Records per chunk in `batch_store`; bounds memory and log granularity.
const STORE_BATCH_SIZE: usize = 50;

/// Owns the four per-attribute collections and all vectorization state.
pub struct EmbeddingIndex {
    database: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
}

impl EmbeddingIndex {
    pub fn new(database: Arc<Database>, embedding_service: Arc<EmbeddingService>) -> Self {
        Self {
            database,
            embedding_service,
        }
    }

    /// True iff the contact has an entry in **all four** attribute
    /// collections. Partial coverage and lookup errors both report false so
    /// the catch-up sweep re-processes the record.
    pub async fn is_vectorized(&self, user_id: Uuid, url: &str) -> bool {
        let key = crate::models::contact_key(url);
        if key.is_empty() {
            return false;
        }

        for attribute in ContactAttribute::ALL {
            match self
                .database
                .has_embedding(user_id, attribute.as_str(), key)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Not vectorized in {}: {}", attribute, key);
                    return false;
                }
                Err(e) => {
                    error!("Error checking vectorization for {}: {}", key, e);
                    return false;
                }
            }
        }

        true
    }

    /// Enriched contacts that are not yet fully vectorized.
    pub async fn get_unvectorized(
        &self,
        user_id: Uuid,
        contacts: &HashMap<String, ContactRecord>,
    ) -> Vec<ContactRecord> {
        let mut unvectorized = Vec::new();

        for (url, contact) in contacts {
            if contact.enriched && !self.is_vectorized(user_id, url).await {
                unvectorized.push(contact.clone());
            }
        }

        info!("Found {} contacts needing vectorization", unvectorized.len());
        unvectorized
    }

    /// Embed and upsert all four attributes of one contact. The embeddings
    /// are computed in a single batched call; a failed write for one
    /// attribute is logged and does not block the remaining attributes.
    pub async fn store(&self, user_id: Uuid, contact: &ContactRecord) -> Result<()> {
        let key = contact.contact_key();
        if key.is_empty() {
            return Ok(());
        }

        let texts = attribute_texts(contact);
        let contents: Vec<String> = texts.iter().map(|(_, text)| text.clone()).collect();
        let embeddings = self.embedding_service.generate_batch(&contents).await?;

        let name = contact.full_name();
        let company = if contact.current_company.is_empty() {
            &contact.company
        } else {
            &contact.current_company
        };

        for ((attribute, content), embedding) in texts.iter().zip(embeddings) {
            if let Err(e) = self
                .database
                .upsert_embedding(
                    user_id,
                    attribute.as_str(),
                    key,
                    content,
                    embedding,
                    &name,
                    company,
                    &contact.url,
                )
                .await
            {
                error!("Failed to store {} embedding for {}: {}", attribute, key, e);
            }
        }

        Ok(())
    }

    /// Vectorize many contacts in fixed-size batches; one failing record
    /// never aborts the rest.
    pub async fn batch_store(&self, user_id: Uuid, contacts: &[ContactRecord]) {
        let batches = contacts.len().div_ceil(STORE_BATCH_SIZE);

        for (batch_index, batch) in contacts.chunks(STORE_BATCH_SIZE).enumerate() {
            info!("Vectorizing batch {}/{}", batch_index + 1, batches);

            for contact in batch {
                if let Err(e) = self.store(user_id, contact).await {
                    error!("Failed to vectorize contact {}: {}", contact.url, e);
                }
            }
        }

        info!("Completed vectorization of {} contacts", contacts.len());
    }
}

/// The text embedded for each attribute, with the "N/A" fallback applied.
/// The position attribute prefers the enriched headline over the raw
/// uploaded position.
#[must_use]
pub fn attribute_texts(contact: &ContactRecord) -> [(ContactAttribute, String); 4] {
    [
        (
            ContactAttribute::Summary,
            non_empty_or(&contact.summary, NOT_AVAILABLE),
        ),
        (
            ContactAttribute::Position,
            if contact.headline.is_empty() {
                non_empty_or(&contact.position, NOT_AVAILABLE)
            } else {
                contact.headline.clone()
            },
        ),
        (
            ContactAttribute::Location,
            non_empty_or(&contact.location, NOT_AVAILABLE),
        ),
        (
            ContactAttribute::Industry,
            non_empty_or(&contact.industry, NOT_AVAILABLE),
        ),
    ]
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched_contact() -> ContactRecord {
        let mut contact = ContactRecord::basic(
            "Jane",
            "Doe",
            "https://www.linkedin.com/in/jane-doe",
            "jane@example.com",
            "Acme",
            "Engineer",
            "01 Jan 2024",
        );
        contact.enriched = true;
        contact.summary = "Builds search systems".to_string();
        contact.headline = "Staff Engineer at Acme".to_string();
        contact.location = "Berlin, Germany".to_string();
        contact.industry = "Software".to_string();
        contact
    }

    #[test]
    fn test_attribute_texts_full_record() {
        let texts = attribute_texts(&enriched_contact());
        assert_eq!(texts[0].1, "Builds search systems");
        assert_eq!(texts[1].1, "Staff Engineer at Acme");
        assert_eq!(texts[2].1, "Berlin, Germany");
        assert_eq!(texts[3].1, "Software");
    }

    #[test]
    fn test_attribute_texts_position_falls_back() {
        let mut contact = enriched_contact();
        contact.headline.clear();
        let texts = attribute_texts(&contact);
        assert_eq!(texts[1].1, "Engineer");

        contact.position.clear();
        let texts = attribute_texts(&contact);
        assert_eq!(texts[1].1, NOT_AVAILABLE);
    }

    #[test]
    fn test_attribute_texts_sentinel_for_missing() {
        let contact = ContactRecord::basic(
            "Jo",
            "Null",
            "https://www.linkedin.com/in/jo-null",
            "",
            "",
            "",
            "",
        );
        let texts = attribute_texts(&contact);
        assert_eq!(texts[0].1, NOT_AVAILABLE);
        assert_eq!(texts[1].1, NOT_AVAILABLE);
        assert_eq!(texts[2].1, NOT_AVAILABLE);
        assert_eq!(texts[3].1, NOT_AVAILABLE);
    }
}
