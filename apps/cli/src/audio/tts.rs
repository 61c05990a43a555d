//! Speech synthesis for missing pronunciation files.

use std::collections::HashSet;
use std::time::Duration;

use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AudioLibrary;
use crate::config::TtsConfig;
use crate::error::AudioError;
use crate::retry::{retry_with_backoff, BackoffPolicy};

/// Turns text into MP3 bytes.
#[allow(async_fn_in_trait)]
pub trait SpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AudioError>;
}

/// Google Cloud Text-to-Speech REST client.
pub struct GoogleTts {
    client: Client,
    config: TtsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    audio_content: String,
}

impl GoogleTts {
    pub fn new(config: TtsConfig) -> Result<Self, AudioError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AudioError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.config.language_code,
                "name": self.config.voice_name,
            },
            "audioConfig": { "audioEncoding": "MP3" },
        })
    }
}

impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AudioError> {
        let resp = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", &self.config.api_key)])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| AudioError::Network(e.to_string()))?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AudioError::RateLimited);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(AudioError::Backend { status, message });
        }

        let body: SynthesisResponse = resp
            .json()
            .await
            .map_err(|e| AudioError::Decode(e.to_string()))?;
        decode_audio(&body.audio_content)
    }
}

fn decode_audio(content: &str) -> Result<Vec<u8>, AudioError> {
    if content.is_empty() {
        return Err(AudioError::Decode("empty audioContent".to_string()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(content)
        .map_err(|e| AudioError::Decode(e.to_string()))
}

/// Outcome of an audio generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub generated: usize,
    pub already_present: usize,
    /// Words abandoned after errors or exhausted retries.
    pub failed: Vec<String>,
}

/// Synthesize audio for every word that has no file in `library` yet.
///
/// Rate-limited calls are retried under `policy`; other failures abandon the
/// word and move on. Only a failure to create the audio directory is fatal.
pub async fn generate_missing<T, I>(
    synthesizer: &T,
    library: &AudioLibrary,
    words: I,
    policy: &BackoffPolicy,
) -> Result<GenerationReport, AudioError>
where
    T: SpeechSynthesizer,
    I: IntoIterator<Item = String>,
{
    tokio::fs::create_dir_all(library.dir()).await?;

    let mut report = GenerationReport::default();
    let mut seen = HashSet::new();

    for word in words {
        let word = word.trim().to_string();
        if word.is_empty() {
            continue;
        }
        let path = library.path_for(&word);
        if !seen.insert(path.clone()) {
            continue;
        }
        if path.is_file() {
            tracing::debug!("Audio file already exists for: {}", word);
            report.already_present += 1;
            continue;
        }

        let result = retry_with_backoff(policy, AudioError::is_retryable, || {
            synthesizer.synthesize(&word)
        })
        .await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to generate audio for {}: {}", word, e);
                report.failed.push(word);
                continue;
            }
        };

        match tokio::fs::write(&path, bytes).await {
            Ok(()) => {
                tracing::info!("Generated audio for: {}", word);
                report.generated += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", path.display(), e);
                report.failed.push(word);
            }
        }
    }

    Ok(report)
}
