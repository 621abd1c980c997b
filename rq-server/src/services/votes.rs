//! Choice vote tallies
//!
//! Counts live in process memory only and reset on restart. Choice ids are
//! not checked against the segment's choice list.

use rq_common::{Error, Result, VoteCounts};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct VoteTracker {
    /// segment id -> choice id -> count
    tallies: Mutex<HashMap<String, VoteCounts>>,
}

impl VoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the tally for one choice and return the new count
    ///
    /// The whole read-modify-write happens under one lock, so concurrent
    /// votes on the same key are never lost.
    pub fn record_vote(&self, segment_id: &str, choice_id: &str) -> Result<u64> {
        if segment_id.trim().is_empty() {
            return Err(Error::InvalidInput("segment_id must not be empty".to_string()));
        }
        if choice_id.trim().is_empty() {
            return Err(Error::InvalidInput("choice_id must not be empty".to_string()));
        }

        let mut tallies = self.tallies.lock().unwrap_or_else(|e| e.into_inner());
        let count = tallies
            .entry(segment_id.to_string())
            .or_default()
            .entry(choice_id.to_string())
            .or_insert(0);
        *count = count.saturating_add(1);

        debug!(segment_id = %segment_id, choice_id = %choice_id, count = *count, "Vote recorded");
        Ok(*count)
    }

    /// Snapshot of the counts for a segment; empty if never voted on
    pub fn get_counts(&self, segment_id: &str) -> VoteCounts {
        let tallies = self.tallies.lock().unwrap_or_else(|e| e.into_inner());
        tallies.get(segment_id).cloned().unwrap_or_default()
    }
}
