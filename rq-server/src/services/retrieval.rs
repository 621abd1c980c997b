//! Segment retrieval: content store first, then the built-in fallback table

use rq_common::{Error, Result, Segment};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::mock;
use crate::store::ContentStore;

/// Where a segment was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentSource {
    Store,
    Mock,
}

#[derive(Debug, Clone)]
pub struct Retrieved {
    pub segment: Segment,
    pub source: SegmentSource,
}

pub struct RetrievalService {
    store: ContentStore,
}

impl RetrievalService {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Fetch a segment by id
    ///
    /// One lookup attempt per backend, no retry. A store miss or store error
    /// falls through to the fallback table; `NotFound` only when both miss.
    pub async fn fetch(&self, segment_id: &str) -> Result<Retrieved> {
        if segment_id.trim().is_empty() {
            return Err(Error::InvalidInput("segment id must not be empty".to_string()));
        }

        if self.store.is_available() {
            match self.store.get(segment_id).await {
                Ok(Some(segment)) => {
                    info!(segment_id = %segment_id, title = %segment.title, "Found segment in store");
                    return Ok(Retrieved {
                        segment,
                        source: SegmentSource::Store,
                    });
                }
                Ok(None) => {
                    info!(segment_id = %segment_id, "Segment not in store, trying fallback data");
                }
                Err(e) => {
                    warn!(segment_id = %segment_id, error = %e, "Store lookup failed, using fallback data");
                }
            }
        } else {
            debug!(segment_id = %segment_id, "Store unavailable, using fallback data");
        }

        match mock::mock_segment(segment_id) {
            Some(segment) => Ok(Retrieved {
                segment,
                source: SegmentSource::Mock,
            }),
            None => {
                warn!(segment_id = %segment_id, "Segment not found");
                Err(Error::NotFound(format!("segment '{}'", segment_id)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rq_common::Choice;

    #[tokio::test]
    async fn test_store_segment_wins_over_mock() {
        let store = ContentStore::in_memory().await.unwrap();
        let custom = Segment::new("intro", "Stored Intro", "From the database.")
            .with_choice(Choice::new("a", "Go", "forest"));
        store.upsert(&custom).await.unwrap();

        let retrieval = RetrievalService::new(store);
        let found = retrieval.fetch("intro").await.unwrap();
        assert_eq!(found.source, SegmentSource::Store);
        assert_eq!(found.segment.id, "intro");
        assert_eq!(found.segment.title, "Stored Intro");
    }

    #[tokio::test]
    async fn test_store_miss_falls_back_to_mock() {
        let store = ContentStore::in_memory().await.unwrap();
        let retrieval = RetrievalService::new(store);

        let found = retrieval.fetch("forest").await.unwrap();
        assert_eq!(found.source, SegmentSource::Mock);
        assert_eq!(found.segment.id, "forest");
    }

    #[tokio::test]
    async fn test_unavailable_store_uses_mock() {
        let retrieval = RetrievalService::new(ContentStore::unavailable());

        let found = retrieval.fetch("mountain").await.unwrap();
        assert_eq!(found.source, SegmentSource::Mock);
        assert_eq!(found.segment.id, "mountain");
    }

    #[tokio::test]
    async fn test_absent_everywhere_is_not_found() {
        let store = ContentStore::in_memory().await.unwrap();
        let retrieval = RetrievalService::new(store);

        assert!(matches!(retrieval.fetch("nowhere").await, Err(Error::NotFound(_))));

        let offline = RetrievalService::new(ContentStore::unavailable());
        assert!(matches!(offline.fetch("nowhere").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_id_is_invalid() {
        let retrieval = RetrievalService::new(ContentStore::unavailable());
        assert!(matches!(retrieval.fetch("  ").await, Err(Error::InvalidInput(_))));
    }
}
