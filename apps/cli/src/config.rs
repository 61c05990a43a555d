//! Service configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first (see `run()`).

use crate::error::ConfigError;

pub const DEFAULT_MOCHI_URL: &str = "https://app.mochi.cards/api";
pub const DEFAULT_ROOT_DECK_NAME: &str = "Hebrew Vocabulary";
pub const DEFAULT_TEMPLATE_ID: &str = "B2rpVqXM";
pub const SKILLS_DECK_NAME: &str = "Skills";

pub const DEFAULT_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
pub const DEFAULT_TTS_LANGUAGE: &str = "he-IL";
pub const DEFAULT_TTS_VOICE: &str = "he-IL-Wavenet-A";

/// Mochi API settings.
#[derive(Debug, Clone)]
pub struct MochiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Existing root deck to sync into, if any.
    pub root_deck_id: Option<String>,
    /// Name used to find or create the root deck.
    pub root_deck_name: String,
    pub template_id: String,
}

impl MochiConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            root_deck_id: None,
            root_deck_name: DEFAULT_ROOT_DECK_NAME.to_string(),
            template_id: DEFAULT_TEMPLATE_ID.to_string(),
        }
    }

    /// Required: `MOCHI_API_KEY`. Optional: `MOCHI_BASE_URL`,
    /// `MOCHI_ROOT_DECK_ID`, `MOCHI_ROOT_DECK_NAME`, `MOCHI_TEMPLATE_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = required("MOCHI_API_KEY")?;
        let base_url = optional("MOCHI_BASE_URL").unwrap_or_else(|| DEFAULT_MOCHI_URL.to_string());
        validate_url("MOCHI_BASE_URL", &base_url)?;

        let mut config = Self::new(api_key, base_url);
        config.root_deck_id = optional("MOCHI_ROOT_DECK_ID");
        if let Some(name) = optional("MOCHI_ROOT_DECK_NAME") {
            config.root_deck_name = name;
        }
        if let Some(template_id) = optional("MOCHI_TEMPLATE_ID") {
            config.template_id = template_id;
        }
        Ok(config)
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub endpoint: String,
    pub language_code: String,
    pub voice_name: String,
}

impl TtsConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            language_code: DEFAULT_TTS_LANGUAGE.to_string(),
            voice_name: DEFAULT_TTS_VOICE.to_string(),
        }
    }

    /// Required: `GOOGLE_TTS_API_KEY`. Optional: `GOOGLE_TTS_URL`, `GOOGLE_TTS_VOICE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = required("GOOGLE_TTS_API_KEY")?;
        let endpoint = optional("GOOGLE_TTS_URL").unwrap_or_else(|| DEFAULT_TTS_URL.to_string());
        validate_url("GOOGLE_TTS_URL", &endpoint)?;

        let mut config = Self::new(api_key, endpoint);
        if let Some(voice) = optional("GOOGLE_TTS_VOICE") {
            config.voice_name = voice;
        }
        Ok(config)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_url(name: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            message: "URL must start with http:// or https://".to_string(),
        })
    }
}
