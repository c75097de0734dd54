//! Per-attribute vector collection storage and similarity queries

use pgvector::Vector;
use uuid::Uuid;

use super::Database;
use crate::Result;

/// One nearest-neighbor hit from an attribute collection, with the
/// denormalized metadata stored at write time (no join at query time).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttributeHit {
    pub contact_key: String,
    pub name: String,
    pub company: String,
    pub url: String,
    pub distance: f64,
}

impl Database {
    /// Upsert one attribute embedding for a contact. Replaces any previous
    /// vector for the same (user, attribute, contact) triple.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_embedding(
        &self,
        user_id: Uuid,
        attribute: &str,
        contact_key: &str,
        content: &str,
        embedding: Vec<f32>,
        name: &str,
        company: &str,
        url: &str,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO contact_embeddings
                (user_id, attribute, contact_key, content, embedding, name, company, url, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (user_id, attribute, contact_key) DO UPDATE SET
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding,
                name = EXCLUDED.name,
                company = EXCLUDED.company,
                url = EXCLUDED.url,
                updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(attribute)
        .bind(contact_key)
        .bind(content)
        .bind(Vector::from(embedding))
        .bind(name)
        .bind(company)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether an entry exists for this contact in one attribute collection.
    pub async fn has_embedding(
        &self,
        user_id: Uuid,
        attribute: &str,
        contact_key: &str,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM contact_embeddings
                WHERE user_id = $1 AND attribute = $2 AND contact_key = $3
            )
            ",
        )
        .bind(user_id)
        .bind(attribute)
        .bind(contact_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Cosine-distance scan over one attribute collection, spanning the
    /// user's entire collection so scores can be aggregated fairly across
    /// attributes before the final truncation.
    pub async fn query_attribute(
        &self,
        user_id: Uuid,
        attribute: &str,
        query_embedding: Vec<f32>,
    ) -> Result<Vec<AttributeHit>> {
        let hits: Vec<AttributeHit> = sqlx::query_as(
            r"
            SELECT contact_key, name, company, url,
                   (embedding <=> $3)::float8 AS distance
            FROM contact_embeddings
            WHERE user_id = $1 AND attribute = $2
            ORDER BY embedding <=> $3
            ",
        )
        .bind(user_id)
        .bind(attribute)
        .bind(Vector::from(query_embedding))
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }

    /// Number of entries in one attribute collection for a user.
    pub async fn count_embeddings(&self, user_id: Uuid, attribute: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_embeddings WHERE user_id = $1 AND attribute = $2",
        )
        .bind(user_id)
        .bind(attribute)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
