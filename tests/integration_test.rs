use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use connrag::database::Database;
use connrag::embeddings::EmbeddingIndex;
use connrag::embeddings::EmbeddingService;
use connrag::enrichment::EnrichmentService;
use connrag::enrichment::ProfileSource;
use connrag::enrichment::ProgressRegistry;
use connrag::models::ContactRecord;
use connrag::models::RawProfile;
use connrag::upload;
use connrag::AppConfig;
use connrag::Result;
use futures::future::BoxFuture;
use sqlx::PgPool;
use uuid::Uuid;

async fn setup_test_db() -> Result<Database> {
    // Load configuration from config.toml
    let config = AppConfig::load()?;

    // Create database connection pool with config
    let pool = PgPool::connect(config.database_url()).await?;

    let db = Database::new(pool);

    // Initialize schema
    db.init_schema().await?;

    Ok(db)
}

fn sample_contact(slug: &str) -> ContactRecord {
    ContactRecord::basic(
        "Test",
        slug,
        format!("https://www.linkedin.com/in/{slug}"),
        "test@example.com",
        "Acme",
        "Engineer",
        "01 Jan 2024",
    )
}

#[tokio::test]
#[ignore = "requires a running Postgres with pgvector"]
async fn test_contact_upsert_is_idempotent() -> Result<()> {
    let db = setup_test_db().await?;
    let user = Uuid::new_v4();

    let contact = sample_contact("idempotent-check");
    db.upsert_contact(user, &contact).await?;
    db.upsert_contact(user, &contact).await?;

    let cache = db.load_contacts(user).await?;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache[&contact.url], contact);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Postgres with pgvector"]
async fn test_reupload_preserves_enrichment_fields() -> Result<()> {
    let db = setup_test_db().await?;
    let user = Uuid::new_v4();

    let mut enriched = sample_contact("reupload-check");
    enriched.enriched = true;
    enriched.summary = "Deep expertise in distributed storage".to_string();
    enriched.location = "Berlin, Germany".to_string();
    db.upsert_contact(user, &enriched).await?;

    // A later upload carries only the basic fields, with a new company.
    let mut fresh = sample_contact("reupload-check");
    fresh.company = "Globex".to_string();
    fresh.position = String::new();

    let mut cache = db.load_contacts(user).await?;
    upload::merge_basic(&mut cache, &[fresh]);
    db.save_contacts(user, &cache).await?;

    let reloaded = db.load_contacts(user).await?;
    let merged = &reloaded[&enriched.url];
    assert!(merged.enriched);
    assert_eq!(merged.summary, "Deep expertise in distributed storage");
    assert_eq!(merged.location, "Berlin, Germany");
    assert_eq!(merged.company, "Globex");
    // Empty upload position keeps the cached value.
    assert_eq!(merged.position, "Engineer");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Postgres with pgvector"]
async fn test_failed_save_leaves_no_partial_state() -> Result<()> {
    let db = setup_test_db().await?;
    let user = Uuid::new_v4();

    let good = sample_contact("atomic-good");
    let mut bad = sample_contact("atomic-bad");
    // NUL bytes are rejected by Postgres text columns, failing the save.
    bad.summary = "broken\0record".to_string();

    let cache: HashMap<String, ContactRecord> = [
        (good.url.clone(), good),
        (bad.url.clone(), bad),
    ]
    .into();

    assert!(db.save_contacts(user, &cache).await.is_err());

    // The save is one transaction: the valid record must not survive alone.
    let reloaded = db.load_contacts(user).await?;
    assert!(reloaded.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Postgres with pgvector"]
async fn test_users_do_not_see_each_others_contacts() -> Result<()> {
    let db = setup_test_db().await?;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    db.upsert_contact(alice, &sample_contact("isolation-check")).await?;

    let bobs = db.load_contacts(bob).await?;
    assert!(bobs.is_empty());

    Ok(())
}

/// Resolves URLs containing "has-data" to a document, everything else to
/// no data, standing in for the external profile service.
struct CannedProfiles;

impl ProfileSource for CannedProfiles {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<RawProfile>> {
        let document = if url.contains("has-data") {
            let mut raw = RawProfile::default();
            raw.summary = format!("Profile document for {url}");
            raw.headline = "Staff Engineer".to_string();
            Some(raw)
        } else {
            None
        };
        Box::pin(async move { document })
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres with pgvector"]
async fn test_enrichment_run_settles_every_unit() -> Result<()> {
    let mut config = AppConfig::load()?;
    config.enrichment.rate_limit_ms = 0;
    config.enrichment.max_concurrent_requests = 5;
    // Unreachable embedding endpoint: vectorization soft-fails per unit
    // and must not block enrichment.
    config.embeddings.api_key = None;
    config.embeddings.endpoint = "http://127.0.0.1:9".to_string();

    let db = Arc::new(setup_test_db().await?);
    let embedding_service = Arc::new(EmbeddingService::new(&config)?);
    let index = Arc::new(EmbeddingIndex::new(db.clone(), embedding_service));
    let progress = Arc::new(ProgressRegistry::new());
    let service = EnrichmentService::new(
        &config,
        db.clone(),
        index,
        Arc::new(CannedProfiles),
        progress.clone(),
    );

    let user = Uuid::new_v4();
    // Three units get a document, two come back with no data.
    let connections = vec![
        sample_contact("run-has-data-a"),
        sample_contact("run-has-data-b"),
        sample_contact("run-has-data-c"),
        sample_contact("run-no-data-d"),
        sample_contact("run-no-data-e"),
    ];
    let total = connections.len();

    // Watch the live counter while the run executes; it must never
    // move backwards.
    let watcher = {
        let progress = progress.clone();
        tokio::spawn(async move {
            let mut last = 0;
            loop {
                let snapshot = progress.get(user);
                if snapshot.total == total {
                    assert!(snapshot.current >= last);
                    last = snapshot.current;
                    if snapshot.completed {
                        return last;
                    }
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    service.run(connections, user).await?;
    let observed = watcher.await.unwrap();
    assert_eq!(observed, total);

    let snapshot = progress.get(user);
    assert_eq!(snapshot.current, total);
    assert_eq!(snapshot.total, total);
    assert!(snapshot.completed);
    assert!(!snapshot.in_progress);

    // Every unit persisted; only the ones with a document are enriched.
    let cache = db.load_contacts(user).await?;
    assert_eq!(cache.len(), total);
    let enriched: Vec<_> = cache.values().filter(|c| c.enriched).collect();
    assert_eq!(enriched.len(), 3);
    assert!(enriched.iter().all(|c| c.url.contains("has-data")));
    assert!(cache
        .values()
        .filter(|c| c.url.contains("no-data"))
        .all(|c| !c.enriched && c.summary.is_empty()));

    Ok(())
}

#[tokio::test]
#[ignore = "requires Postgres with pgvector and an embedding endpoint"]
async fn test_vectorization_covers_all_attributes() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Arc::new(setup_test_db().await?);
    let embedding_service = Arc::new(EmbeddingService::new(&config)?);
    let index = EmbeddingIndex::new(db.clone(), embedding_service);

    let user = Uuid::new_v4();
    let mut contact = sample_contact("vectorize-check");
    contact.enriched = true;
    contact.summary = "Search infrastructure specialist".to_string();
    contact.headline = "Staff Engineer".to_string();
    contact.location = "Austin, Texas".to_string();
    contact.industry = "Software".to_string();

    assert!(!index.is_vectorized(user, &contact.url).await);

    index.store(user, &contact).await?;
    assert!(index.is_vectorized(user, &contact.url).await);

    for attribute in connrag::embeddings::ContactAttribute::ALL {
        assert_eq!(db.count_embeddings(user, attribute.as_str()).await?, 1);
    }

    Ok(())
}

#[tokio::test]
#[ignore = "requires Postgres with pgvector and an embedding endpoint"]
async fn test_catchup_picks_up_enriched_but_unvectorized() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Arc::new(setup_test_db().await?);
    let embedding_service = Arc::new(EmbeddingService::new(&config)?);
    let index = EmbeddingIndex::new(db.clone(), embedding_service);

    let user = Uuid::new_v4();

    let mut enriched = sample_contact("catchup-enriched");
    enriched.enriched = true;
    enriched.summary = "Payments platform veteran".to_string();
    let plain = sample_contact("catchup-plain");

    let cache: HashMap<String, ContactRecord> = [
        (enriched.url.clone(), enriched.clone()),
        (plain.url.clone(), plain),
    ]
    .into();
    db.save_contacts(user, &cache).await?;

    // Only the enriched contact qualifies for catch-up.
    let pending = index.get_unvectorized(user, &cache).await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, enriched.url);

    index.batch_store(user, &pending).await;
    assert!(index.get_unvectorized(user, &cache).await.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "requires Postgres with pgvector and an embedding endpoint"]
async fn test_attribute_query_orders_by_similarity() -> Result<()> {
    let config = AppConfig::load()?;
    let db = Arc::new(setup_test_db().await?);
    let embedding_service = Arc::new(EmbeddingService::new(&config)?);
    let index = EmbeddingIndex::new(db.clone(), embedding_service.clone());

    let user = Uuid::new_v4();

    let mut berlin = sample_contact("query-berlin");
    berlin.enriched = true;
    berlin.location = "Berlin, Germany".to_string();
    let mut tokyo = sample_contact("query-tokyo");
    tokyo.enriched = true;
    tokyo.location = "Tokyo, Japan".to_string();

    index.store(user, &berlin).await?;
    index.store(user, &tokyo).await?;

    let query = embedding_service.generate("Berlin").await?;
    let hits = db.query_attribute(user, "location", query).await?;

    // Whole-collection scan: both contacts come back, nearest first.
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].contact_key, berlin.contact_key());
    assert!(hits[0].distance <= hits[1].distance);

    Ok(())
}
