//! In-memory vector index over the catalog summaries.
//!
//! ## Algorithm
//! 1. At build time, embed every catalog summary with the provider
//! 2. At query time, embed the query with that same provider
//! 3. Rank all entries by cosine distance (in parallel with Rayon)
//! 4. Return the nearest `top_k` as candidates
//!
//! The provider is owned by the index, so there is no way to query with a
//! different embedding model than the one used to build it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use catalog::Catalog;
use llm_client::EmbeddingProvider;
use tracing::{debug, info, instrument};

use crate::distance::rank_by_distance;
use crate::traits::CandidateRetriever;
use crate::types::Candidate;

/// Vector index over a read-only catalog
pub struct RetrievalIndex {
    /// Shared reference to the catalog
    catalog: Arc<Catalog>,

    /// Embedding provider used at build time; reused for every query
    embedder: Arc<dyn EmbeddingProvider>,

    /// One vector per catalog entry, same order as the catalog
    vectors: Vec<Vec<f32>>,

    dimensions: usize,

    /// Entries farther than this are never returned (unbounded by default)
    max_distance: Option<f32>,
}

impl RetrievalIndex {
    /// Embed all catalog summaries and build the index.
    pub async fn build(catalog: Arc<Catalog>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let start = Instant::now();
        let summaries = catalog.summaries();

        let vectors = embedder
            .embed_batch(&summaries)
            .await
            .context("Embedding catalog summaries")?;

        if vectors.len() != summaries.len() {
            bail!(
                "Embedding provider returned {} vectors for {} catalog entries",
                vectors.len(),
                summaries.len()
            );
        }

        let dimensions = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some(position) = vectors.iter().position(|v| v.len() != dimensions) {
            bail!(
                "Inconsistent embedding dimensions: entry {} has {}, expected {}",
                position,
                vectors[position].len(),
                dimensions
            );
        }

        info!(
            "Built retrieval index: {} entries, model={}, dimensions={} in {:.2?}",
            vectors.len(),
            embedder.model_name(),
            dimensions,
            start.elapsed()
        );

        Ok(Self {
            catalog,
            embedder,
            vectors,
            dimensions,
            max_distance: None,
        })
    }

    /// Configure the maximum distance a candidate may have (default: unbounded)
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }
}

#[async_trait]
impl CandidateRetriever for RetrievalIndex {
    #[instrument(skip(self, query))]
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        if top_k == 0 || self.is_empty() {
            debug!("Nothing to search (top_k={}, entries={})", top_k, self.len());
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query)
            .await
            .context("Embedding query")?;

        if query_vector.len() != self.dimensions {
            bail!(
                "Query embedding has {} dimensions, index was built with {}",
                query_vector.len(),
                self.dimensions
            );
        }

        let ranked = rank_by_distance(&query_vector, &self.vectors, top_k, self.max_distance);
        let candidates: Vec<Candidate> = ranked
            .into_iter()
            .filter_map(|(position, distance)| {
                self.catalog
                    .get(position)
                    .map(|entry| Candidate::from_entry(entry, distance))
            })
            .collect();

        debug!("Retrieved {} candidates", candidates.len());
        Ok(candidates)
    }
}
