//! Story search
//!
//! The configured [`SearchMode`] picks exactly one strategy per request;
//! lexical and semantic results are never merged.

use rq_common::config::SearchConfig;
use rq_common::{Error, Result, SearchHit, SearchMode, Segment};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::mock;
use crate::services::embedding::{cosine_similarity, HashingEmbedder, TextEmbedder};
use crate::store::ContentStore;

/// Maximum lexical matches taken from the store
pub const LEXICAL_LIMIT: i64 = 10;

pub struct SearchService {
    store: ContentStore,
    mode: SearchMode,
    top_k: usize,
    num_candidates: usize,
    embedder: Arc<dyn TextEmbedder>,
}

impl SearchService {
    pub fn new(store: ContentStore, config: &SearchConfig) -> Self {
        Self {
            store,
            mode: config.mode,
            top_k: config.top_k,
            num_candidates: config.num_candidates,
            embedder: Arc::new(HashingEmbedder::default()),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn TextEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Run a query with the configured strategy
    ///
    /// Empty or whitespace-only queries are rejected before any backend is
    /// touched. A query matching nothing yields an empty list.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("search query must not be empty".to_string()));
        }

        info!(query = %query, mode = %self.mode, "Searching segments");

        let hits = match self.mode {
            SearchMode::Lexical => self.lexical(query).await,
            SearchMode::Semantic => self.semantic(query).await,
        };

        info!(query = %query, results = hits.len(), "Search complete");
        Ok(hits)
    }

    async fn lexical(&self, query: &str) -> Vec<SearchHit> {
        if self.store.is_available() {
            match self.store.search_text(query, LEXICAL_LIMIT).await {
                Ok(segments) if !segments.is_empty() => {
                    return segments.into_iter().map(SearchHit::lexical).collect();
                }
                Ok(_) => info!(query = %query, "No store matches, using fallback results"),
                Err(e) => warn!(query = %query, error = %e, "Store search failed, using fallback results"),
            }
        } else {
            info!("Store unavailable, using fallback search results");
        }

        mock::mock_search(query)
            .into_iter()
            .map(SearchHit::lexical)
            .collect()
    }

    async fn semantic(&self, query: &str) -> Vec<SearchHit> {
        if !self.store.is_available() {
            warn!("Semantic search requested but the store is unavailable");
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);
        let mut nearest = NearestCandidates::new(self.num_candidates);

        let scanned = self
            .store
            .for_each_indexed(|segment| nearest.offer(&query_vector, segment))
            .await;

        match scanned {
            Ok(scanned) => {
                debug!(scanned, kept = nearest.len(), "Scored indexed segments");
                nearest.into_hits(self.top_k)
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Vector lookup failed");
                Vec::new()
            }
        }
    }

    /// Embed every stored segment and persist the vectors
    ///
    /// One-shot; nothing re-runs it when segments change afterwards.
    pub async fn build_index(&self) -> Result<usize> {
        let segments = self.store.all().await?;
        let mut indexed = 0;

        for segment in &segments {
            let vector = self.embedder.embed(&segment.embedding_text());
            if self.store.set_embedding(&segment.id, &vector).await? {
                indexed += 1;
            }
        }

        info!(
            indexed,
            model = self.embedder.model_name(),
            dimension = self.embedder.dimension(),
            "Search index built"
        );
        Ok(indexed)
    }
}

/// Score candidates against the query and keep the best `k`
///
/// Ordered by non-increasing score, ties by segment id. Candidates without
/// an embedding or with a different dimension are skipped.
pub fn rank_by_similarity(query: &[f32], candidates: Vec<Segment>, k: usize) -> Vec<SearchHit> {
    let mut nearest = NearestCandidates::new(k);
    for segment in candidates {
        nearest.offer(query, segment);
    }
    nearest.into_hits(k)
}

/// Bounded set of the best-scoring segments seen so far
///
/// Min-heap on score: the weakest candidate sits on top and is evicted once
/// the set is over capacity.
pub struct NearestCandidates {
    capacity: usize,
    heap: BinaryHeap<Reverse<Scored>>,
}

impl NearestCandidates {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1).min(1024)),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Score `segment` and keep it if it ranks among the best `capacity`
    pub fn offer(&mut self, query: &[f32], segment: Segment) {
        if self.capacity == 0 {
            return;
        }
        let score = match segment.embedding.as_deref() {
            Some(vector) if vector.len() == query.len() => cosine_similarity(query, vector),
            _ => return,
        };

        self.heap.push(Reverse(Scored { score, segment }));
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// Best `k` hits, highest score first
    pub fn into_hits(self, k: usize) -> Vec<SearchHit> {
        // Ascending order of Reverse<Scored> is best-first
        let mut ranked = self.heap.into_sorted_vec();
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|Reverse(scored)| SearchHit::scored(scored.segment, scored.score))
            .collect()
    }
}

/// A segment with its similarity score; greater means a better match
struct Scored {
    score: f32,
    segment: Segment,
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            // Lower id wins ties
            .then_with(|| other.segment.id.cmp(&self.segment.id))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}
