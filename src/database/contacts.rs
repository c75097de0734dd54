//! Contact record store: per-user load and full-upsert save

use std::collections::HashMap;

use uuid::Uuid;

use super::Database;
use crate::models::ContactRecord;
use crate::Result;

const CONTACT_COLUMNS: &str = "first_name, last_name, url, email, company, position, \
     connected_on, enriched, summary, headline, current_company, current_title, \
     location, education, industry, company_size";

impl Database {
    /// Load all of a user's contacts keyed by profile URL.
    pub async fn load_contacts(&self, user_id: Uuid) -> Result<HashMap<String, ContactRecord>> {
        let records: Vec<ContactRecord> = sqlx::query_as(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records
            .into_iter()
            .map(|record| (record.url.clone(), record))
            .collect())
    }

    /// Upsert every entry of the cache in one transaction. Conflicts on
    /// (user_id, url) replace all record fields, so the in-memory cache is
    /// authoritative. A failure rolls the whole save back; no partial
    /// cache state is ever visible.
    pub async fn save_contacts(
        &self,
        user_id: Uuid,
        cache: &HashMap<String, ContactRecord>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for record in cache.values() {
            upsert_contact_query(user_id, record).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Upsert a single contact record.
    pub async fn upsert_contact(&self, user_id: Uuid, record: &ContactRecord) -> Result<()> {
        upsert_contact_query(user_id, record)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Count a user's contacts, total and enriched.
    pub async fn contact_counts(&self, user_id: Uuid) -> Result<(i64, i64)> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let enriched = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contacts WHERE user_id = $1 AND enriched",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((total, enriched))
    }
}

/// The full-record upsert, bound and ready for any executor.
fn upsert_contact_query(
    user_id: Uuid,
    record: &ContactRecord,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r"
            INSERT INTO contacts (
                user_id, first_name, last_name, url, email, company, position,
                connected_on, enriched, summary, headline, current_company,
                current_title, location, education, industry, company_size, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW())
            ON CONFLICT (user_id, url) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                company = EXCLUDED.company,
                position = EXCLUDED.position,
                connected_on = EXCLUDED.connected_on,
                enriched = EXCLUDED.enriched,
                summary = EXCLUDED.summary,
                headline = EXCLUDED.headline,
                current_company = EXCLUDED.current_company,
                current_title = EXCLUDED.current_title,
                location = EXCLUDED.location,
                education = EXCLUDED.education,
                industry = EXCLUDED.industry,
                company_size = EXCLUDED.company_size,
                updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.url)
        .bind(&record.email)
        .bind(&record.company)
        .bind(&record.position)
        .bind(&record.connected_on)
        .bind(record.enriched)
        .bind(&record.summary)
        .bind(&record.headline)
        .bind(&record.current_company)
        .bind(&record.current_title)
        .bind(&record.location)
        .bind(&record.education)
        .bind(&record.industry)
        .bind(&record.company_size)
}
