use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use catalog::Catalog;
use colored::Colorize;
use llm_client::OpenAiClient;
use moderation::ModerationGate;
use retrieval::{Candidate, CandidateRetriever, HashingEmbedder, RetrievalIndex};
use server::{Librarian, LibrarianResponse, RecommendationResult, Settings, SUMMARY_NOT_FOUND};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

/// Smart Librarian - book recommendations from a small catalog
#[derive(Parser)]
#[command(name = "smart-librarian")]
#[command(about = "Conversational book recommender with retrieval and tool calling", long_about = None)]
struct Cli {
    /// Catalog JSON file (defaults to LIBRARIAN_CATALOG, then the bundled catalog)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Number of candidates to retrieve (defaults to LIBRARIAN_TOP_K)
    #[arg(long, global = true)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend one book for a question
    Recommend {
        /// The reader's question
        query: String,

        /// Show the recommended title, full summary and candidates
        #[arg(long)]
        explain: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session; type 'exit' or 'quit' to leave
    Chat {
        /// Show the recommended title, full summary and candidates
        #[arg(long)]
        explain: bool,
    },

    /// Show the nearest catalog entries for a query
    Search {
        query: String,

        /// Use the local feature-hashing embedder instead of the remote service
        #[arg(long)]
        offline: bool,
    },

    /// Print the full summary for an exact title
    Summary { title: String },

    /// Run only the moderation checks and print the verdict as JSON
    Moderate { text: String },

    /// List the catalog
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::global()
        .context("Failed to read configuration")?
        .clone();
    if let Some(path) = cli.catalog {
        settings.catalog_path = Some(path);
    }
    if let Some(top_k) = cli.top_k {
        settings.recommender = settings.recommender.with_top_k(top_k);
    }

    let start = Instant::now();
    let catalog = server::load_catalog(settings.catalog_path.as_deref())?;
    info!("Loaded {} books in {:?}", catalog.len(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            query,
            explain,
            json,
        } => handle_recommend(&settings, catalog, &query, explain, json).await?,
        Commands::Chat { explain } => handle_chat(&settings, catalog, explain).await?,
        Commands::Search { query, offline } => {
            handle_search(&settings, catalog, &query, offline).await?
        }
        Commands::Summary { title } => handle_summary(&catalog, &title)?,
        Commands::Moderate { text } => handle_moderate(&settings, &text).await?,
        Commands::Catalog => handle_catalog(&catalog),
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    settings: &Settings,
    catalog: Arc<Catalog>,
    query: &str,
    explain: bool,
    json: bool,
) -> Result<()> {
    let librarian = Librarian::connect(settings, catalog).await?;
    let response = librarian.handle(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response, explain);
    }
    Ok(())
}

/// Handle the 'chat' command
async fn handle_chat(settings: &Settings, catalog: Arc<Catalog>, explain: bool) -> Result<()> {
    let librarian = Librarian::connect(settings, catalog).await?;

    println!("{}", "=== Smart Librarian ===".bold().blue());
    println!("Scrie 'exit' sau 'quit' pentru a ieși.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nIntrebare: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match librarian.handle(query).await {
            Ok(response) => print_response(&response, explain),
            Err(e) => eprintln!("{} {:#}", "Eroare:".red(), e),
        }
    }
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(
    settings: &Settings,
    catalog: Arc<Catalog>,
    query: &str,
    offline: bool,
) -> Result<()> {
    let index = if offline {
        RetrievalIndex::build(catalog, Arc::new(HashingEmbedder::default())).await?
    } else {
        let client = OpenAiClient::new(settings.openai_config()?)?;
        RetrievalIndex::build(catalog, Arc::new(client)).await?
    };

    let candidates = index.search(query, settings.recommender.top_k).await?;

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    if candidates.is_empty() {
        println!("No matching books.");
    }
    print_candidates(&candidates);
    Ok(())
}

/// Handle the 'summary' command
fn handle_summary(catalog: &Catalog, title: &str) -> Result<()> {
    let entry = catalog
        .get_by_title(title)
        .ok_or_else(|| anyhow!("Book {:?} not found in catalog", title))?;

    println!("{}", entry.title.bold().blue());
    println!("{}", entry.full_summary.as_deref().unwrap_or(SUMMARY_NOT_FOUND));
    Ok(())
}

/// Handle the 'moderate' command
async fn handle_moderate(settings: &Settings, text: &str) -> Result<()> {
    let client = Arc::new(OpenAiClient::new(settings.openai_config()?)?);
    let gate = ModerationGate::from_config(&settings.moderation, client.clone(), client);

    let verdict = gate.moderate(text).await?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

/// Handle the 'catalog' command
fn handle_catalog(catalog: &Catalog) {
    println!("{}", format!("Catalog ({} books):", catalog.len()).bold().blue());
    for entry in catalog.entries() {
        println!("{} {} - {}", entry.id.dimmed(), entry.title.green(), entry.summary);
    }
}

/// Helper function to print a librarian response
fn print_response(response: &LibrarianResponse, explain: bool) {
    match response {
        LibrarianResponse::Blocked { message, .. } => {
            println!("\n{} {}", "[Moderare]".yellow(), message);
        }
        LibrarianResponse::Recommendation(result) => {
            println!("\n{}", "=== Recomandare ===".bold().blue());
            println!("{}", result.answer);
            if explain {
                print_explanation(result);
            }
        }
    }
}

fn print_explanation(result: &RecommendationResult) {
    if let Some(title) = &result.recommended_title {
        println!("\n{} {}", "Titlu ales:".bold(), title.green());
    }
    if let Some(summary) = &result.full_summary {
        println!("\n{}", "Rezumat complet:".bold());
        println!("{}", summary);
    }
    if !result.candidates.is_empty() {
        println!("\n{}", "Candidați:".bold());
        print_candidates(&result.candidates);
    }
}

fn print_candidates(candidates: &[Candidate]) {
    for (rank, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {} - distance: {:.3}",
            (rank + 1).to_string().green(),
            candidate.title,
            candidate.score
        );
        println!("   {}", candidate.summary);
    }
}
