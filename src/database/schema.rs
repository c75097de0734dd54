use super::Database;
use crate::Result;

impl Database {
    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        // One row per (user, profile URL); enrichment columns default empty.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contacts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL,
                url TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                company TEXT NOT NULL DEFAULT '',
                position TEXT NOT NULL DEFAULT '',
                connected_on TEXT NOT NULL DEFAULT '',
                enriched BOOLEAN NOT NULL DEFAULT FALSE,
                summary TEXT NOT NULL DEFAULT '',
                headline TEXT NOT NULL DEFAULT '',
                current_company TEXT NOT NULL DEFAULT '',
                current_title TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                education TEXT NOT NULL DEFAULT '',
                industry TEXT NOT NULL DEFAULT '',
                company_size TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE(user_id, url)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // One row per (user, attribute, contact); the four attribute
        // partitions act as four independent vector collections.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contact_embeddings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL,
                attribute VARCHAR(32) NOT NULL,
                contact_key TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding VECTOR(1536) NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                company TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE(user_id, attribute, contact_key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        self.create_indexes().await?;

        Ok(())
    }

    async fn create_indexes(&self) -> Result<()> {
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_contact_embeddings_user_attr \
             ON contact_embeddings(user_id, attribute)",
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("Essential indexes ensured");
        Ok(())
    }
}
