use anyhow::{Context, Result};
use std::env;

pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiProviderConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            host: GEMINI_HOST.to_string(),
            api_key,
            model: GEMINI_DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a config from the environment. The API key is required;
    /// host and model have defaults that suit normal use.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY must be set (add it to your environment or .env file)")?;

        let mut config = Self::new(api_key);
        if let Ok(host) = env::var("GEMINI_HOST") {
            config.host = host;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
