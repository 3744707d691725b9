use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

pub const API_ENDPOINT: &str = "https://api.sarvam.ai/text-to-speech";
pub const API_KEY_HEADER: &str = "api-subscription-key";
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// The one codec requested from the API and expected by the sink.
pub const OUTPUT_AUDIO_CODEC: &str = "wav";

/// The API rejects requests above ~2500 characters; chunk well under it.
pub const MAX_CHUNK_SIZE: usize = 2000;

/// Reject encoded audio payloads above this size (50 MB base64).
pub const MAX_AUDIO_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const DEFAULT_LANGUAGE: &str = "hi-IN";
pub const DEFAULT_SPEAKER: &str = "shubh";
pub const DEFAULT_PACE: f32 = 1.0;
pub const DEFAULT_MODEL: &str = "bulbul:v3";

pub const MIN_PACE: f32 = 0.3;
pub const MAX_PACE: f32 = 3.0;

// Keys into the persisted settings store.
pub const KEY_API_KEY: &str = "sarvam_api_key";
pub const KEY_LANGUAGE: &str = "selected_language";
pub const KEY_SPEAKER: &str = "selected_speaker";
pub const KEY_PACE: &str = "selected_pace";
pub const KEY_MODEL: &str = "selected_model";

pub const ENV_API_KEY: &str = "VANI_API_KEY";
pub const ENV_LANGUAGE: &str = "VANI_LANGUAGE";
pub const ENV_SPEAKER: &str = "VANI_SPEAKER";
pub const ENV_PACE: &str = "VANI_PACE";
pub const ENV_MODEL: &str = "VANI_MODEL";

pub const DEFAULT_TEXT_LIMIT: usize = 2500;

/// Per-model input length limit in characters, enforced by observers
/// before issuing a play request.
pub fn model_text_limit(model: &str) -> usize {
    match model {
        "bulbul:v3" => 2500,
        "bulbul:v2" => 1500,
        _ => DEFAULT_TEXT_LIMIT,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language(pub String);

impl Language {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Speaker(pub String);

impl Speaker {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptySpeaker);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self(DEFAULT_SPEAKER.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn text_limit(&self) -> usize {
        model_text_limit(&self.0)
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_owned())
    }
}

/// Speech rate multiplier, bounded to what the API accepts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Pace(f32);

impl Pace {
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if !value.is_finite() || !(MIN_PACE..=MAX_PACE).contains(&value) {
            return Err(ConfigError::PaceOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Default for Pace {
    fn default() -> Self {
        Self(DEFAULT_PACE)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Immutable snapshot captured when a play request is accepted. Changing
/// persisted settings mid-playback only affects the next request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSettings {
    pub api_key: ApiKey,
    pub language: Language,
    pub speaker: Speaker,
    pub pace: Pace,
    pub model: ModelId,
}

/// Optional fields carried by a play request; anything missing resolves
/// from the persisted store, then from the built-in defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsOverrides {
    pub language: Option<String>,
    pub speaker: Option<String>,
    pub pace: Option<f32>,
    pub model: Option<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("language must not be empty")]
    EmptyLanguage,
    #[error("speaker must not be empty")]
    EmptySpeaker,
    #[error("model must not be empty")]
    EmptyModel,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("api key not configured")]
    MissingApiKey,
    #[error("pace {0} outside supported range {MIN_PACE}..={MAX_PACE}")]
    PaceOutOfRange(f32),
}

/// Persisted key-value configuration. The credential always comes from
/// here; the remaining settings act as defaults for omitted request
/// fields.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

fn env_var_for(key: &str) -> Option<&'static str> {
    match key {
        KEY_API_KEY => Some(ENV_API_KEY),
        KEY_LANGUAGE => Some(ENV_LANGUAGE),
        KEY_SPEAKER => Some(ENV_SPEAKER),
        KEY_PACE => Some(ENV_PACE),
        KEY_MODEL => Some(ENV_MODEL),
        _ => None,
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnvSettingsStore;

impl SettingsStore for EnvSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        env_var_for(key).and_then(|var| std::env::var(var).ok())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl MemorySettingsStore {
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Build the settings snapshot for one play request. The credential is
/// required; a stored pace that does not parse falls back to the default
/// rather than failing the request.
pub fn resolve_settings(
    overrides: &SettingsOverrides,
    store: &impl SettingsStore,
) -> Result<PlaybackSettings, ConfigError> {
    let api_key = match store.get(KEY_API_KEY) {
        Some(v) => ApiKey::new(v)?,
        None => return Err(ConfigError::MissingApiKey),
    };

    let language = Language::new(
        overrides
            .language
            .clone()
            .or_else(|| store.get(KEY_LANGUAGE))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
    )?;

    let speaker = Speaker::new(
        overrides
            .speaker
            .clone()
            .or_else(|| store.get(KEY_SPEAKER))
            .unwrap_or_else(|| DEFAULT_SPEAKER.to_owned()),
    )?;

    let pace = match overrides.pace {
        Some(p) => Pace::new(p)?,
        None => store
            .get(KEY_PACE)
            .and_then(|v| v.parse::<f32>().ok())
            .and_then(|p| Pace::new(p).ok())
            .unwrap_or_default(),
    };

    let model = ModelId::new(
        overrides
            .model
            .clone()
            .or_else(|| store.get(KEY_MODEL))
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
    )?;

    Ok(PlaybackSettings {
        api_key,
        language,
        speaker,
        pace,
        model,
    })
}
