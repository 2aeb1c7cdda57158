use crate::error::{AppError, Result};
use crate::gate::TrialPolicy;
use dotenvy::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: String,
    /// Model used for video analysis (text generation with search grounding).
    pub text_model: String,
    /// Model used for synthesis, derivation and edits.
    pub image_model: String,
    /// Base URL of the generateContent API.
    pub api_base: String,
    /// Pricing policy applied by the usage gate.
    pub pricing: TrialPolicy,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::Config("GEMINI_API_KEY must be set in environment or .env file".to_string()))?;

        let text_model = env::var("GEMINI_TEXT_MODEL")
            .unwrap_or_else(|_| "gemini-flash-latest".to_string());

        let image_model = env::var("GEMINI_IMAGE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string());

        let api_base = env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string())
            .trim_end_matches('/')
            .to_string();

        let pricing = match env::var("THUMBSMITH_PRICING") {
            Ok(value) => TrialPolicy::parse(&value)
                .ok_or_else(|| AppError::config(format!("Invalid THUMBSMITH_PRICING value: {value}")))?,
            Err(_) => TrialPolicy::default(),
        };

        Ok(Self {
            gemini_api_key: api_key,
            text_model,
            image_model,
            api_base,
            pricing,
        })
    }
}
