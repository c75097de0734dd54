use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use connrag::config::AppConfig;
use connrag::database::Database;
use connrag::embeddings::EmbeddingIndex;
use connrag::embeddings::EmbeddingService;
use connrag::enrichment::EnrichmentService;
use connrag::enrichment::ProfileFetcher;
use connrag::enrichment::ProgressRegistry;
use connrag::llm::LlmService;
use connrag::search::SemanticRetriever;
use connrag::upload;
use connrag::Result;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "connrag")]
#[command(about = "Contact enrichment and mission-driven semantic retrieval")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Disable CORS
        #[arg(long)]
        no_cors: bool,
    },
    /// Create database tables and indexes
    InitSchema,
    /// Ingest a connections CSV and enrich the new contacts
    Enrich {
        /// User the contacts belong to
        #[arg(long)]
        user: Uuid,
        /// Path to the connections CSV export
        #[arg(long)]
        file: String,
    },
    /// Vectorize enriched contacts that missed vectorization
    Catchup {
        /// User the contacts belong to
        #[arg(long)]
        user: Uuid,
    },
    /// Rank contacts against a mission statement
    Search {
        /// User whose contacts to search
        #[arg(long)]
        user: Uuid,
        /// Free-text mission statement
        mission: String,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    if cli.verbose {
        connrag::logging::init_logging(None)?;
    } else {
        connrag::logging::init_logging(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, no_cors } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = !no_cors && config.server.enable_cors;
            connrag::api::serve_api(&config, host, port, enable_cors).await?;
        }
        Commands::InitSchema => {
            let db = Database::from_config(&config).await?;
            db.init_schema().await?;
            println!("Schema initialized");
        }
        Commands::Enrich { user, file } => {
            handle_enrich_command(&config, user, &file).await?;
        }
        Commands::Catchup { user } => {
            let (db, index, enrichment) = build_pipeline(&config).await?;
            let cache = db.load_contacts(user).await?;
            let unvectorized = index.get_unvectorized(user, &cache).await;
            enrichment.vectorization_catchup(unvectorized, user).await;
        }
        Commands::Search { user, mission } => {
            handle_search_command(&config, user, &mission).await?;
        }
        Commands::Config => {
            println!("Database URL: {}", config.database_url());
            println!("Embedding model: {}", config.embedding_model());
            println!("Embedding dimension: {}", config.embedding_dimension());
            println!("Fetch endpoint: {}", config.fetch_endpoint());
            println!("Max concurrent requests: {}", config.max_concurrent_requests());
            println!("Rate limit (ms): {}", config.rate_limit_ms());
            println!("Search results: {}", config.n_results());
            println!("LLM model: {}", config.llm_model());
            println!("Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

async fn build_pipeline(
    config: &AppConfig,
) -> Result<(Arc<Database>, Arc<EmbeddingIndex>, EnrichmentService)> {
    let database = Arc::new(Database::from_config(config).await?);
    database.init_schema().await?;

    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let index = Arc::new(EmbeddingIndex::new(
        database.clone(),
        embedding_service.clone(),
    ));
    let fetcher = Arc::new(ProfileFetcher::new(config)?);
    let progress = Arc::new(ProgressRegistry::new());
    let enrichment =
        EnrichmentService::new(config, database.clone(), index.clone(), fetcher, progress);

    Ok((database, index, enrichment))
}

async fn handle_enrich_command(config: &AppConfig, user: Uuid, file: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let connections = upload::parse_connections_csv(&content)?;
    println!("Parsed {} connections from {}", connections.len(), file);

    let (database, _index, enrichment) = build_pipeline(config).await?;

    let mut cache = database.load_contacts(user).await?;
    let to_enrich = upload::identify_unenriched(&cache, &connections);
    upload::merge_basic(&mut cache, &connections);
    database.save_contacts(user, &cache).await?;

    println!("{} contacts need enrichment", to_enrich.len());
    if !to_enrich.is_empty() {
        enrichment.run(to_enrich, user).await?;
    }

    let (total, enriched) = database.contact_counts(user).await?;
    println!("Done: {enriched}/{total} contacts enriched");
    Ok(())
}

async fn handle_search_command(config: &AppConfig, user: Uuid, mission: &str) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let llm = Arc::new(LlmService::new(config)?);
    let retriever = SemanticRetriever::new(database, embedding_service, llm, config.search.clone());

    let attributes = retriever.extract_mission_attributes(mission).await;
    println!("Mission attributes:");
    println!("  position: {}", attributes.position);
    println!("  location: {}", attributes.location);
    println!("  industry: {}", attributes.industry);

    let results = retriever.search(user, &attributes).await?;
    if results.is_empty() {
        println!("No matching contacts found");
        return Ok(());
    }

    println!("\nTop {} contacts:", results.len());
    for (rank, contact) in results.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:<24} score {:.3}  {}",
            rank + 1,
            contact.name,
            contact.company,
            contact.similarity_score,
            contact.url
        );
    }
    Ok(())
}
