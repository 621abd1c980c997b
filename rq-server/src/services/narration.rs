//! Lazy narration of story segments
//!
//! Audio is generated the first time a segment without `audio_url` is
//! served. Failures never block the segment itself; the caller logs the
//! error and renders without audio. Stale audio is not invalidated when a
//! segment's text changes.

use async_trait::async_trait;
use rq_common::config::TtsConfig;
use rq_common::{Error, Result, Segment};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::services::audio_store::AudioStore;
use crate::store::ContentStore;

/// Spoken words per second assumed for duration estimates
const SECONDS_PER_WORD: f64 = 0.5;

/// Voice requested for a synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    pub language_code: String,
    pub voice_name: String,
}

impl From<&TtsConfig> for VoiceConfig {
    fn from(config: &TtsConfig) -> Self {
        Self {
            language_code: config.language_code.clone(),
            voice_name: config.voice_name.clone(),
        }
    }
}

/// Text-to-speech backend
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend identifier for logs
    fn backend_id(&self) -> &'static str;

    /// Synthesize speech for `text` in `voice`, returning encoded audio bytes
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>>;

    /// Check if the backend is usable (credentials configured, etc.)
    fn is_available(&self) -> bool {
        true
    }
}

/// Result of [`NarrationService::ensure_narration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// Audio already existed; the backend was not called
    AlreadyPresent,
    Generated { bytes: usize },
}

/// Narration details attached to story responses
#[derive(Debug, Clone, Serialize)]
pub struct NarrationMetadata {
    pub word_count: usize,
    pub estimated_duration_secs: f64,
    pub language_code: String,
    pub voice_name: String,
    pub audio_format: &'static str,
    pub tts_ready: bool,
}

pub struct NarrationService {
    backend: Option<Arc<dyn SpeechBackend>>,
    audio: AudioStore,
    store: ContentStore,
    voice: VoiceConfig,
}

impl NarrationService {
    pub fn new(
        backend: Option<Arc<dyn SpeechBackend>>,
        audio: AudioStore,
        store: ContentStore,
        config: &TtsConfig,
    ) -> Self {
        Self {
            backend,
            audio,
            store,
            voice: VoiceConfig::from(config),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_available())
    }

    pub fn audio_store(&self) -> &AudioStore {
        &self.audio
    }

    /// Make sure `segment` has narration, generating it if needed
    ///
    /// Skips the backend when `audio_url` is already set or a non-empty
    /// audio file for the segment exists. On success `segment.audio_url` is filled in
    /// and, best effort, persisted to the content store.
    pub async fn ensure_narration(&self, segment: &mut Segment) -> Result<NarrationOutcome> {
        if segment.audio_url.is_some() {
            return Ok(NarrationOutcome::AlreadyPresent);
        }

        if self.audio.exists(&segment.id).await {
            segment.audio_url = Some(AudioStore::audio_url(&segment.id));
            return Ok(NarrationOutcome::AlreadyPresent);
        }

        let backend = self
            .backend
            .as_ref()
            .filter(|b| b.is_available())
            .ok_or_else(|| Error::BackendUnavailable("narration backend not initialized".to_string()))?;

        info!(segment_id = %segment.id, backend = backend.backend_id(), "Generating narration");

        let audio = backend.synthesize(&segment.content, &self.voice).await.map_err(|e| match e {
            Error::SynthesisFailure(_) | Error::BackendUnavailable(_) => e,
            other => Error::SynthesisFailure(other.to_string()),
        })?;
        if audio.is_empty() {
            return Err(Error::SynthesisFailure("backend returned no audio".to_string()));
        }

        self.audio.save(&segment.id, &audio).await?;

        let url = AudioStore::audio_url(&segment.id);
        if self.store.is_available() {
            if let Err(e) = self.store.set_audio_url(&segment.id, &url).await {
                warn!(segment_id = %segment.id, error = %e, "Failed to persist audio URL");
            }
        }
        segment.audio_url = Some(url);

        info!(segment_id = %segment.id, bytes = audio.len(), "Narration generated");
        Ok(NarrationOutcome::Generated { bytes: audio.len() })
    }

    pub fn metadata(&self, segment: &Segment) -> NarrationMetadata {
        let word_count = segment.word_count();
        NarrationMetadata {
            word_count,
            estimated_duration_secs: word_count as f64 * SECONDS_PER_WORD,
            language_code: self.voice.language_code.clone(),
            voice_name: self.voice.voice_name.clone(),
            audio_format: "MP3",
            tts_ready: self.is_available(),
        }
    }
}
