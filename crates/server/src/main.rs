//! Simple test harness for the librarian.
//!
//! Runs one query (the first argument, or a default) through moderation and
//! the recommendation pipeline against the live services.

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use server::{Librarian, LibrarianResponse, Settings, load_catalog};

const DEFAULT_QUERY: &str = "Vreau o carte despre prietenie și curaj.";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,moderation=debug,retrieval=debug")),
        )
        .init();

    info!("Starting Smart Librarian test harness");

    let settings = Settings::global()?;
    let catalog = load_catalog(settings.catalog_path.as_deref())?;
    info!("Catalog loaded ({} books)", catalog.len());

    let librarian = Librarian::connect(settings, catalog).await?;

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());
    debug!("Query: {}", query);

    match librarian.handle(&query).await? {
        LibrarianResponse::Blocked { message, verdict } => {
            info!("Blocked by {:?}", verdict.fired_by);
            info!("{}", message);
        }
        LibrarianResponse::Recommendation(result) => {
            info!("Answer: {}", result.answer);
            info!("Recommended title: {:?}", result.recommended_title);
            for (i, candidate) in result.candidates.iter().enumerate() {
                info!(
                    "{}. {} (distance {:.3})",
                    i + 1,
                    candidate.title,
                    candidate.score
                );
            }
            if let Some(summary) = result.full_summary {
                info!("Full summary: {}", summary);
            }
        }
    }

    Ok(())
}
