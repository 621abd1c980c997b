//! Story services
//!
//! Each service receives its collaborators at construction; handlers call
//! them directly, one after another, within a single request.

pub mod audio_store;
pub mod embedding;
pub mod narration;
pub mod retrieval;
pub mod search;
pub mod tts_client;
pub mod votes;

pub use audio_store::AudioStore;
pub use embedding::{HashingEmbedder, TextEmbedder};
pub use narration::{
    NarrationMetadata, NarrationOutcome, NarrationService, SpeechBackend, VoiceConfig,
};
pub use retrieval::{RetrievalService, Retrieved, SegmentSource};
pub use search::SearchService;
pub use tts_client::GoogleTtsClient;
pub use votes::VoteTracker;
