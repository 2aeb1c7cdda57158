//! Thumbsmith Core Library
//!
//! This library provides the core functionality for the Thumbsmith cover
//! image generator: the generation pipeline, its gating and storage layers,
//! and the Gemini AI integration.
//!
//! # Overview
//!
//! Thumbsmith turns a video URL plus optional notes and subject photos into
//! four promotional cover images (normal and clickbait tone, each in 16:9
//! and 9:16), then lets the user refine them with per-variant edit/undo.
//! The library handles:
//!
//! - **Analysis**: search-grounded video summarization via [`analyzer`]
//! - **Synthesis & Derivation**: the concurrent image pipeline via
//!   [`synthesizer`], [`deriver`] and [`orchestrator`]
//! - **Editing**: per-slot undo stacks via [`editor`]
//! - **Gating**: the trial/payment gate via [`gate`]
//! - **Persistence**: capped, quota-aware session storage via [`store`]
//! - **AI Integration**: the Gemini multimodal client via [`gemini`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`ThumbSmith`] facade:
//!
//! ```ignore
//! use thumbsmith_core::{ThumbSmith, GenerationConfig};
//!
//! // Initialize with environment configuration
//! let mut app = ThumbSmith::new()?;
//!
//! let outcome = app.generate(GenerationConfig {
//!     video_url: "https://youtu.be/dQw4w9WgXcQ".into(),
//!     additional_context: "cooking video".into(),
//!     reference_images: vec![],
//! }).await?;
//!
//! println!("{}", outcome.summary);
//! ```

pub mod analyzer;
pub mod config;
pub mod deriver;
pub mod editor;
pub mod error;
pub mod gate;
pub mod gemini;
pub mod image_processing;
pub mod orchestrator;
pub mod store;
pub mod synthesizer;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export primary types for convenience
pub use config::Config;
pub use editor::ResultSession;
pub use error::{AppError, Result};
pub use gate::{GateOutcome, PaymentProvider, TrialPolicy, UsageGate};
pub use gemini::{GeminiClient, GenerationService};
pub use orchestrator::{GenerationOutcome, Orchestrator, Phase};
pub use store::{HistoryItem, JsonFileBackend, SessionStore};
pub use types::{GenerationConfig, Orientation, Slot, Style, ThumbnailSet};

/// Main entry point for the Thumbsmith application.
///
/// This struct provides a facade over the various subsystems, wiring the
/// Gemini client, the persisted session store, and the orchestrator. It's
/// the recommended way to use the library for most use cases.
pub struct ThumbSmith {
    config: Config,
    client: GeminiClient,
    store: SessionStore<JsonFileBackend>,
}

impl ThumbSmith {
    /// Creates a new instance with environment-based configuration and the
    /// default on-disk session store.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration (such as the API key) is
    /// missing or invalid.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let client = GeminiClient::new(&config)?;
        let store = SessionStore::open(JsonFileBackend::new());
        Ok(Self { config, client, store })
    }

    /// Returns a usage gate configured with the active pricing policy.
    pub fn gate(&self) -> UsageGate {
        UsageGate::new(self.config.pricing)
    }

    /// Runs one full generation for an admitted config.
    ///
    /// On success the store gains one history entry; on failure the error
    /// message is the user-facing one and nothing is persisted.
    pub async fn generate(&mut self, config: GenerationConfig) -> Result<GenerationOutcome> {
        let mut orchestrator = Orchestrator::new(&self.client);
        orchestrator.run(config, &mut self.store).await
    }

    /// Opens an edit session over a completed generation's images.
    pub fn open_session(&self, images: &ThumbnailSet) -> ResultSession {
        ResultSession::new(images)
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore<JsonFileBackend> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore<JsonFileBackend> {
        &mut self.store
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present and sets up the environment.
pub fn init() {
    let _ = dotenvy::dotenv();
}
