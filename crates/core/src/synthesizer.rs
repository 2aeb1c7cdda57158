//! Thumbnail synthesis.
//!
//! One call per style/orientation: the instruction template is chosen by
//! style, every reference image is attached regardless of style, and the
//! aspect-ratio directive rides on the request config. Exactly one attempt;
//! a text-only answer surfaces as a refusal carrying the model's own words.

use crate::error::Result;
use crate::gemini::{GenerationService, PromptPart};
use crate::types::{Orientation, Style};

const NORMAL_TEMPLATE: &str = "\
You are an expert thumbnail designer working for one of the most subscribed video channels; \
the bar is set very high. Create a dramatic and compelling thumbnail.

Rules:
1. Interpret the visual description below as the overall idea; do not render it word for word.
2. Place a 4-7 word tagline on the thumbnail, derived from the description.
3. Several photos of the subject are attached. Pick EXACTLY ONE of them (the most fitting for \
the context), crop the main reaction into a circle, and place it where it works best.
4. THERE MUST NOT BE ANY HUMAN IN THE THUMBNAIL OTHER THAN THE PROVIDED SUBJECT PHOTO. \
Do not invent a new person.
5. The aspect ratio is provided with the request; compose the design for it.
6. Keep the layout uncluttered, high quality, dramatic and compelling.
7. DO NOT ASK QUESTIONS. DO NOT REFUSE TO GENERATE.";

const CLICKBAIT_TEMPLATE: &str = "\
You are an expert thumbnail designer working for one of the most subscribed video channels; \
the bar is set very high. Create a dramatic and compelling thumbnail.

Rules:
1. Interpret the visual description below as the overall idea; do not render it word for word.
2. Place a 4-7 word tagline on the thumbnail. The tagline must be NEGATIVE and exaggerated so \
it works as clickbait.
3. Several photos of the subject are attached. Pick EXACTLY ONE of them (the most fitting for \
the context), crop the main reaction into a circle, and place it where it works best.
4. THERE MUST NOT BE ANY HUMAN IN THE THUMBNAIL OTHER THAN THE PROVIDED SUBJECT PHOTO. \
Do not invent a new person.
5. The aspect ratio is provided with the request; compose the design for it.
6. Keep the layout uncluttered, high quality, dramatic and compelling.
7. DO NOT ASK QUESTIONS. DO NOT REFUSE TO GENERATE.

Extras:
- The thumbnail must signal the OPPOSITE of what the video concludes, so curious viewers click \
to find out whether they are making a mistake.
- Even the imagery should hint that the viewer is about to make a mistake with the main product.";

/// Synthesizes one thumbnail for the given style and orientation.
///
/// Returns the base64 image payload. A text-only reply becomes
/// [`crate::error::AppError::Refusal`] with the text verbatim; an empty reply
/// becomes [`crate::error::AppError::EmptyResult`].
pub async fn synthesize<S: GenerationService>(
    service: &S,
    summary: &str,
    notes: &str,
    reference_images: &[String],
    style: Style,
    orientation: Orientation,
) -> Result<String> {
    let mut parts = vec![PromptPart::text(build_prompt(summary, notes, style))];
    // Subject references ride along regardless of style.
    for reference in reference_images {
        if !reference.trim().is_empty() {
            parts.push(PromptPart::jpeg(reference.clone()));
        }
    }
    if parts.len() == 1 {
        tracing::warn!("no reference images supplied, the model may invent a person");
    }

    let response = service.generate_image(&parts, orientation).await?;
    response.into_image(&format!("{style} thumbnail synthesis"))
}

fn build_prompt(summary: &str, notes: &str, style: Style) -> String {
    let template = match style {
        Style::Normal => NORMAL_TEMPLATE,
        Style::Clickbait => CLICKBAIT_TEMPLATE,
    };
    let notes_section = if notes.trim().is_empty() {
        String::new()
    } else {
        format!("ADDITIONAL NOTES BY THE USER: {notes}\n")
    };
    format!("{template}\n\nVISUAL DESCRIPTION: {summary}\n{notes_section}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_support::{CallKind, MockService};

    fn refs() -> Vec<String> {
        vec!["cmVmMQ==".to_string(), "cmVmMg==".to_string()]
    }

    #[tokio::test]
    async fn attaches_every_reference_image() {
        let service = MockService::new();
        service.push_image(Ok(crate::gemini::ImageResponse {
            image: Some("aW1n".into()),
            text: None,
        }));

        let image = synthesize(&service, "summary", "notes", &refs(), Style::Normal, Orientation::Horizontal)
            .await
            .unwrap();
        assert_eq!(image, "aW1n");

        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Image);
        assert_eq!(calls[0].inline_payloads, vec!["cmVmMQ==", "cmVmMg=="]);
        assert_eq!(calls[0].ratio.as_deref(), Some("16:9"));
    }

    #[test]
    fn templates_differ_only_in_tone() {
        let normal = build_prompt("s", "", Style::Normal);
        let clickbait = build_prompt("s", "", Style::Clickbait);
        assert!(clickbait.contains("NEGATIVE"));
        assert!(!normal.contains("NEGATIVE"));
        for prompt in [&normal, &clickbait] {
            assert!(prompt.contains("EXACTLY ONE"));
            assert!(prompt.contains("MUST NOT BE ANY HUMAN"));
            assert!(prompt.contains("aspect ratio"));
        }
    }

    #[tokio::test]
    async fn text_reply_surfaces_as_verbatim_refusal() {
        let service = MockService::new();
        service.push_image(Ok(crate::gemini::ImageResponse {
            image: None,
            text: Some("policy violation".into()),
        }));

        let err = synthesize(&service, "s", "", &refs(), Style::Clickbait, Orientation::Horizontal)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "policy violation");
    }

    #[tokio::test]
    async fn empty_reply_surfaces_as_empty_result() {
        let service = MockService::new();
        service.push_image(Ok(crate::gemini::ImageResponse::default()));

        let err = synthesize(&service, "s", "", &refs(), Style::Normal, Orientation::Horizontal)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyResult(_)));
    }
}
