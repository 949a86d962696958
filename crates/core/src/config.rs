use std::env;
use crate::error::{AppError, Result};
use dotenvy::dotenv;
use url::Url;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Endpoint root of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` is allowed here; the client reports it on first use.
    pub gemini_api_key: Option<String>,
    pub model_name: String,
    pub base_url: Url,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let mut builder = Config::builder().with_model(
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        );
        if let Some(key) = api_key {
            builder = builder.with_api_key(key);
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Model name without the `models/` resource prefix.
    pub fn model_id(&self) -> &str {
        self.model_name
            .strip_prefix("models/")
            .unwrap_or(&self.model_name)
    }

    /// Full `generateContent` endpoint for the configured model.
    pub fn generate_content_url(&self) -> Result<Url> {
        self.base_url
            .join(&format!("models/{}:generateContent", self.model_id()))
            .map_err(|e| AppError::config(format!("Invalid model endpoint: {}", e)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<Config> {
        let model_name = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut raw_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Url::join drops the last segment unless the base ends with a slash
        if !raw_url.ends_with('/') {
            raw_url.push('/');
        }
        let base_url = Url::parse(&raw_url)
            .map_err(|e| AppError::config(format!("Invalid base URL: {}", e)))?;

        Ok(Config {
            gemini_api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            model_name,
            base_url,
        })
    }
}
