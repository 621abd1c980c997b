//! Google Cloud Text-to-Speech client
//!
//! Calls the `text:synthesize` REST endpoint with an API key and decodes the
//! base64 `audioContent` field of the response.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rq_common::config::TtsConfig;
use rq_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::narration::{SpeechBackend, VoiceConfig};

const USER_AGENT: &str = concat!("RadioQuest/", env!("CARGO_PKG_VERSION"));

/// The API rejects longer inputs
pub const MAX_INPUT_CHARS: usize = 5000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

pub struct GoogleTtsClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTtsClient {
    /// Build a client from TTS config; fails without an API key
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::BackendUnavailable("TTS API key not configured".to_string()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechBackend for GoogleTtsClient {
    fn backend_id(&self) -> &'static str {
        "google-cloud-tts"
    }

    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>> {
        let text = truncate_chars(text, MAX_INPUT_CHARS);
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language_code,
                name: &voice.voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        tracing::debug!(chars = text.chars().count(), voice = %voice.voice_name, "Requesting speech synthesis");

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::SynthesisFailure(format!("network error: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::SynthesisFailure("TTS credentials rejected".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisFailure(format!("API error {}: {}", status.as_u16(), body)));
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::SynthesisFailure(format!("parse error: {}", e)))?;

        decode_audio(&body.audio_content)
    }
}

fn decode_audio(encoded: &str) -> Result<Vec<u8>> {
    let audio = STANDARD
        .decode(encoded)
        .map_err(|e| Error::SynthesisFailure(format!("invalid audio encoding: {}", e)))?;
    if audio.is_empty() {
        return Err(Error::SynthesisFailure("empty audio content".to_string()));
    }
    Ok(audio)
}

/// Longest prefix of at most `max` characters, cut on a char boundary
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
