//! One figurine run: resolve the image, fetch it, rotate a key, generate.

use super::command::ParsedCommand;
use super::presets::Preset;
use super::resolver::{self, InboundEvent, ResolveContext};
use crate::config::Settings;
use crate::error::FigurineError;
use crate::llm::{build_request, GenerationResult, ImageGenerator};
use crate::storage::KeyStore;
use std::time::{Duration, Instant};
use tracing::info;

/// Successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Produced image
    pub result: GenerationResult,
    /// Preset that was applied
    pub preset: Preset,
    /// Time spent in the generation call
    pub elapsed: Duration,
}

/// Run Resolve → Fetch → Submit for an already parsed command.
///
/// The key cursor advances once per run that gets as far as submitting,
/// whether or not the API call succeeds.
///
/// # Errors
///
/// Any stage failure is returned as-is; nothing is retried.
pub async fn run(
    generator: &dyn ImageGenerator,
    keys: &KeyStore,
    settings: &Settings,
    command: &ParsedCommand,
    event: &InboundEvent,
) -> Result<Generated, FigurineError> {
    let prompt = command.preset.prompt();

    let ctx = ResolveContext {
        event,
        target_id: command.target_id.as_deref(),
        avatar_url_template: &settings.avatar_url_template,
    };
    let image = resolver::resolve(&ctx).ok_or(FigurineError::NoImageFound)?;
    info!(
        preset = prompt.label,
        source = ?image.source,
        "Resolved source image"
    );

    let image_bytes = generator.fetch_image_bytes(&image.reference).await?;
    let request = build_request(
        &settings.figurine_model,
        prompt.text,
        &image_bytes,
        settings.figurine_max_tokens,
    );
    let api_key = keys.next_key().await?;

    let start = Instant::now();
    let result = generator.submit(&request, &api_key).await?;
    let elapsed = start.elapsed();
    info!(
        preset = prompt.label,
        elapsed_secs = elapsed.as_secs_f64(),
        "Generation finished"
    );

    Ok(Generated {
        result,
        preset: command.preset,
        elapsed,
    })
}

/// Caption attached to a successful reply
#[must_use]
pub fn success_caption(generated: &Generated) -> String {
    format!(
        "✅ 生成完成（{:.2}s）｜预设：{}",
        generated.elapsed.as_secs_f64(),
        generated.preset.label()
    )
}
