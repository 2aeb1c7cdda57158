//! Vertical variant derivation.
//!
//! Takes a finished 16:9 thumbnail and asks the service to recompose it for
//! 9:16 while keeping palette, typography, subject and theme. Never invoked
//! before the matching horizontal synthesis has resolved.

use crate::error::{AppError, Result};
use crate::gemini::{GenerationService, PromptPart};
use crate::types::{Orientation, Style};

/// Derives the 9:16 counterpart of an already-synthesized horizontal image.
pub async fn derive<S: GenerationService>(
    service: &S,
    horizontal_image: &str,
    style: Style,
) -> Result<String> {
    let parts = vec![
        PromptPart::png(horizontal_image.to_string()),
        PromptPart::text(derivation_prompt(style)),
    ];

    let response = service.generate_image(&parts, Orientation::Vertical).await?;
    response
        .into_image(&format!("the {style} vertical variant"))
        .map_err(|err| match err {
            AppError::Refusal(text) => {
                AppError::Refusal(format!("The {style} vertical variant was declined: {text}"))
            }
            other => other,
        })
}

fn derivation_prompt(style: Style) -> String {
    format!(
        "You are an expert thumbnail designer.\n\
         The attached image is a 16:9 (horizontal) thumbnail that was just created.\n\
         Create the 9:16 (vertical) version of this exact thumbnail for short-form feeds.\n\
         \n\
         CRITICAL RULES:\n\
         1. MAINTAIN VISUAL CONSISTENCY: use the same colors, fonts, subject, and overall theme \
         as the attached image.\n\
         2. RECOMPOSE FOR VERTICAL: do not just crop; redesign the layout so it works in 9:16.\n\
         3. Keep the same tagline and branding elements.\n\
         4. DO NOT change the style. It must read as the vertical version of the SAME thumbnail.\n\
         5. Mode context: this is a {style} style thumbnail.\n"
    )
}
