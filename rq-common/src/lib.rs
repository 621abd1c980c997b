//! # RadioQuest Common Library
//!
//! Shared code for the RadioQuest story service:
//! - Story segment data model (segments, choices, search hits, vote counts)
//! - Error taxonomy shared by every service
//! - Configuration loading and root folder resolution
//! - Database schema initialization

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Choice, SearchHit, SearchMode, Segment, VoteCounts};
