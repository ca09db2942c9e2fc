//! Process-wide settings.
//!
//! Values come from the environment (with `.env` support). The parsed
//! [`Settings`] are cached once per process and only read afterwards.

use std::path::PathBuf;
use std::time::Duration;

use llm_client::OpenAiConfig;
use llm_client::openai::{
    DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODERATION_MODEL,
    DEFAULT_TIMEOUT,
};
use moderation::{ModerationConfig, parse_block_categories};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_ROUND1_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_ROUND2_TEMPERATURE: f32 = 0.4;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Errors raised while reading configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting {key}")]
    Missing { key: String },

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error(
        "Round-1 temperature ({round1}) must be strictly greater than round-2 temperature ({round2})"
    )]
    TemperatureOrder { round1: f32, round2: f32 },
}

/// Knobs of the recommendation pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommenderConfig {
    /// Number of candidates retrieved per query
    pub top_k: usize,
    /// Temperature of the call that picks a book
    pub round1_temperature: f32,
    /// Temperature of the call that writes the final answer
    pub round2_temperature: f32,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            round1_temperature: DEFAULT_ROUND1_TEMPERATURE,
            round2_temperature: DEFAULT_ROUND2_TEMPERATURE,
        }
    }
}

impl RecommenderConfig {
    /// Build and validate a config
    pub fn new(top_k: usize, round1_temperature: f32, round2_temperature: f32) -> Result<Self, ConfigError> {
        let config = Self {
            top_k,
            round1_temperature,
            round2_temperature,
        };
        config.validate()?;
        Ok(config)
    }

    /// Temperatures must be finite, within `[0, 2]`, and round 1 hotter than round 2.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("LIBRARIAN_ROUND1_TEMPERATURE", self.round1_temperature),
            ("LIBRARIAN_ROUND2_TEMPERATURE", self.round2_temperature),
        ] {
            if !value.is_finite() || !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "temperature must be between 0 and 2".to_string(),
                });
            }
        }

        if self.round1_temperature <= self.round2_temperature {
            return Err(ConfigError::TemperatureOrder {
                round1: self.round1_temperature,
                round2: self.round2_temperature,
            });
        }
        Ok(())
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Everything the librarian reads from its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Absent when running without live services
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub moderation_model: String,
    pub timeout: Duration,
    pub moderation: ModerationConfig,
    pub recommender: RecommenderConfig,
    /// Catalog file; the bundled catalog is used when unset
    pub catalog_path: Option<PathBuf>,
}

impl Settings {
    /// Build settings from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = match get("OPENAI_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("OPENAI_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_TIMEOUT,
        };

        let moderation = ModerationConfig {
            strict: get("MODERATION_STRICT").is_none_or(|v| parse_flag(&v)),
            block_categories: get("MODERATION_BLOCK_CATEGORIES")
                .map(|v| parse_block_categories(&v))
                .unwrap_or_default(),
            profanity_enabled: get("PROFANITY_BLOCK").is_none_or(|v| parse_flag(&v)),
        };

        let top_k = match get("LIBRARIAN_TOP_K") {
            Some(raw) => parse_number::<usize>("LIBRARIAN_TOP_K", &raw)?,
            None => DEFAULT_TOP_K,
        };
        let round1 = match get("LIBRARIAN_ROUND1_TEMPERATURE") {
            Some(raw) => parse_number::<f32>("LIBRARIAN_ROUND1_TEMPERATURE", &raw)?,
            None => DEFAULT_ROUND1_TEMPERATURE,
        };
        let round2 = match get("LIBRARIAN_ROUND2_TEMPERATURE") {
            Some(raw) => parse_number::<f32>("LIBRARIAN_ROUND2_TEMPERATURE", &raw)?,
            None => DEFAULT_ROUND2_TEMPERATURE,
        };

        Ok(Self {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            chat_model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            moderation_model: get("OPENAI_MODERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_MODERATION_MODEL.to_string()),
            timeout,
            moderation,
            recommender: RecommenderConfig::new(top_k, round1, round2)?,
            catalog_path: get("LIBRARIAN_CATALOG").map(PathBuf::from),
        })
    }

    /// Read settings from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Process-wide settings, read from the environment on first use.
    pub fn global() -> Result<&'static Settings, ConfigError> {
        SETTINGS.get_or_try_init(Self::from_env)
    }

    /// Client configuration for the OpenAI-compatible services.
    pub fn openai_config(&self) -> Result<OpenAiConfig, ConfigError> {
        let api_key = self.api_key.clone().ok_or_else(|| ConfigError::Missing {
            key: "OPENAI_API_KEY".to_string(),
        })?;

        Ok(OpenAiConfig {
            api_key,
            base_url: self.base_url.clone(),
            chat_model: self.chat_model.clone(),
            embedding_model: self.embedding_model.clone(),
            moderation_model: self.moderation_model.clone(),
            timeout: self.timeout,
        })
    }
}

/// Only a case-insensitive `true` counts as true.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
