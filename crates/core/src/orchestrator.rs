//! Top-level generation pipeline.
//!
//! A four-phase state machine drives each attempt:
//!
//! 1. `Input` → `Analyzing` on an admitted config.
//! 2. `Analyzing` → `Generating` once the analyzer resolves (it always does).
//! 3. `Generating` → `Result` once two fan-out/fan-in barriers have joined:
//!    barrier A runs both style syntheses concurrently, barrier B runs both
//!    vertical derivations concurrently, each derivation gated on its own
//!    style's horizontal result.
//! 4. After the phase flips to `Result`, a degree-4 fan-out recompresses all
//!    four images and commits one history entry. Persistence is a side
//!    effect, not a precondition of being done.
//!
//! Any synthesis or derivation error resets the machine to `Input`, discards
//! every partial result of the attempt, and retains the error message as
//! user-facing state. There is no partial-success state and no retry.

use crate::analyzer;
use crate::deriver;
use crate::error::Result;
use crate::gemini::GenerationService;
use crate::image_processing;
use crate::store::{HistoryItem, SessionStore, StateBackend};
use crate::synthesizer;
use crate::types::{GenerationConfig, Orientation, Style, ThumbnailSet};

/// Pipeline phase, observable by the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Input,
    Analyzing,
    Generating,
    Result,
}

/// Working-resolution output of a successful run.
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub summary: String,
    pub images: ThumbnailSet,
}

pub struct Orchestrator<'a, S: GenerationService> {
    service: &'a S,
    phase: Phase,
    last_error: Option<String>,
}

impl<'a, S: GenerationService> Orchestrator<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service, phase: Phase::Input, last_error: None }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Message of the last failed attempt, cleared when a new run starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs one full generation attempt for an admitted config.
    pub async fn run<B: StateBackend>(
        &mut self,
        config: GenerationConfig,
        store: &mut SessionStore<B>,
    ) -> Result<GenerationOutcome> {
        self.last_error = None;
        self.phase = Phase::Analyzing;

        // Infallible by contract: failures collapse into a synthetic summary.
        let summary =
            analyzer::analyze(self.service, &config.video_url, &config.additional_context).await;

        self.phase = Phase::Generating;
        match self.generate_all(&summary, &config).await {
            Ok(images) => {
                self.phase = Phase::Result;
                self.commit_history(&summary, &images, store).await;
                Ok(GenerationOutcome { summary, images })
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.phase = Phase::Input;
                Err(err)
            }
        }
    }

    async fn generate_all(
        &self,
        summary: &str,
        config: &GenerationConfig,
    ) -> Result<ThumbnailSet> {
        // Barrier A: both horizontal syntheses.
        let (normal, clickbait) = tokio::try_join!(
            synthesizer::synthesize(
                self.service,
                summary,
                &config.additional_context,
                &config.reference_images,
                Style::Normal,
                Orientation::Horizontal,
            ),
            synthesizer::synthesize(
                self.service,
                summary,
                &config.additional_context,
                &config.reference_images,
                Style::Clickbait,
                Orientation::Horizontal,
            ),
        )?;

        // Barrier B: each derivation depends on its own horizontal result;
        // the two styles run concurrently with each other.
        let (normal_vertical, clickbait_vertical) = tokio::try_join!(
            deriver::derive(self.service, &normal, Style::Normal),
            deriver::derive(self.service, &clickbait, Style::Clickbait),
        )?;

        Ok(ThumbnailSet { normal, clickbait, normal_vertical, clickbait_vertical })
    }

    /// Recompresses all four images concurrently and appends one history
    /// entry. Failures here are logged only; the result view is unaffected.
    async fn commit_history<B: StateBackend>(
        &self,
        summary: &str,
        images: &ThumbnailSet,
        store: &mut SessionStore<B>,
    ) {
        let (normal, clickbait, normal_vertical, clickbait_vertical) = tokio::join!(
            compressed_copy(images.normal.clone()),
            compressed_copy(images.clickbait.clone()),
            compressed_copy(images.normal_vertical.clone()),
            compressed_copy(images.clickbait_vertical.clone()),
        );
        let compressed = ThumbnailSet { normal, clickbait, normal_vertical, clickbait_vertical };

        let item = HistoryItem::from_generation(
            summary,
            compressed,
            image_processing::timestamp_millis(),
        );
        store.append_history(item);
    }
}

/// Recompresses one payload off the async thread, falling back to the
/// working-resolution copy when recompression fails.
async fn compressed_copy(payload: String) -> String {
    let source = payload.clone();
    match tokio::task::spawn_blocking(move || image_processing::shrink_for_storage(&source)).await {
        Ok(Ok(compressed)) => compressed,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "storage recompression failed, keeping full-size copy");
            payload
        }
        Err(err) => {
            tracing::warn!(error = %err, "recompression task failed, keeping full-size copy");
            payload
        }
    }
}
