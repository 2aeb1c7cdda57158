use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::strip_data_url;
use crate::types::Orientation;
use serde::Deserialize;
use serde_json::{Value, json};

/// One part of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn jpeg(data: impl Into<String>) -> Self {
        Self::InlineImage { mime_type: "image/jpeg".to_string(), data: data.into() }
    }

    pub fn png(data: impl Into<String>) -> Self {
        Self::InlineImage { mime_type: "image/png".to_string(), data: data.into() }
    }

    fn to_json(&self) -> Value {
        match self {
            PromptPart::Text(text) => json!({ "text": text }),
            PromptPart::InlineImage { mime_type, data } => json!({
                "inlineData": { "mimeType": mime_type, "data": strip_data_url(data) }
            }),
        }
    }
}

/// Outcome of an image-generation call: the service answers with inline image
/// data, explanatory text, or nothing at all. Callers decide which error shape
/// a text-only or empty response maps to.
#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub image: Option<String>,
    pub text: Option<String>,
}

impl ImageResponse {
    /// Resolves the response into a base64 image payload.
    ///
    /// Text without image data becomes [`AppError::Refusal`] carrying the text
    /// verbatim; an empty response becomes [`AppError::EmptyResult`] labelled
    /// with `context`.
    pub fn into_image(self, context: &str) -> Result<String> {
        if let Some(image) = self.image {
            return Ok(image);
        }
        if let Some(text) = self.text {
            return Err(AppError::Refusal(text));
        }
        Err(AppError::EmptyResult(context.to_string()))
    }
}

/// Seam between the pipeline and the external multimodal service.
///
/// Production code uses [`GeminiClient`]; orchestration tests substitute a
/// scripted mock.
#[allow(async_fn_in_trait)]
pub trait GenerationService {
    /// Text generation, optionally grounded with Google Search.
    async fn generate_text(&self, prompt: &str, use_search: bool) -> Result<String>;

    /// Image generation/editing from prompt parts plus an aspect-ratio
    /// directive. Exactly one attempt; failures are terminal for the call.
    async fn generate_image(&self, parts: &[PromptPart], orientation: Orientation) -> Result<ImageResponse>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Validate the base URL up front so a malformed override fails loudly
        url::Url::parse(&config.api_base)
            .map_err(|e| AppError::config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            api_base: config.api_base.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn post(&self, model: &str, payload: &Value) -> Result<GenerateContentResponse> {
        let endpoint = self.endpoint_for_model(model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::gemini(format!("API request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::gemini(format!("HTTP {status}: {body}")));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AppError::gemini(format!("Malformed API response: {e}")))
    }
}

impl GenerationService for GeminiClient {
    async fn generate_text(&self, prompt: &str, use_search: bool) -> Result<String> {
        let mut payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if use_search {
            payload["tools"] = json!([{ "googleSearch": {} }]);
        }

        let response = self.post(&self.text_model, &payload).await?;
        let text = response.first_text();
        if text.is_empty() {
            return Err(AppError::gemini("No text response received from Gemini".to_string()));
        }
        Ok(text)
    }

    async fn generate_image(&self, parts: &[PromptPart], orientation: Orientation) -> Result<ImageResponse> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": parts.iter().map(PromptPart::to_json).collect::<Vec<_>>(),
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE", "TEXT"],
                "imageConfig": { "aspectRatio": orientation.ratio() },
            },
        });

        let response = self.post(&self.image_model, &payload).await?;
        Ok(response.into_image_response())
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenates the text parts of the first candidate.
    fn first_text(&self) -> String {
        self.parts()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()
    }

    /// Splits the response into inline image data and accompanying text.
    fn into_image_response(self) -> ImageResponse {
        let mut image = None;
        let mut text = None;
        for part in self.parts() {
            if image.is_none() {
                if let Some(inline) = &part.inline_data {
                    if !inline.data.is_empty() {
                        image = Some(inline.data.clone());
                    }
                }
            }
            if text.is_none() {
                if let Some(t) = &part.text {
                    let trimmed = t.trim();
                    if !trimmed.is_empty() {
                        text = Some(trimmed.to_string());
                    }
                }
            }
        }
        ImageResponse { image, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_response_prefers_inline_data() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/png", "data": "QUJD" } }
            ]}}]
        }))
        .unwrap();
        let response = parsed.into_image_response();
        assert_eq!(response.image.as_deref(), Some("QUJD"));
        assert_eq!(response.into_image("test").unwrap(), "QUJD");
    }

    #[test]
    fn text_only_response_is_a_refusal() {
        let response = ImageResponse { image: None, text: Some("policy violation".into()) };
        let err = response.into_image("thumbnail synthesis").unwrap_err();
        assert!(err.is_refusal());
        assert_eq!(err.to_string(), "policy violation");
    }

    #[test]
    fn empty_response_is_an_empty_result() {
        let err = ImageResponse::default().into_image("thumbnail synthesis").unwrap_err();
        assert_eq!(err.to_string(), "The model returned no image data for thumbnail synthesis");
    }

    #[test]
    fn prompt_parts_strip_data_url_prefixes() {
        let part = PromptPart::png("data:image/png;base64,QUJD");
        let value = part.to_json();
        assert_eq!(value["inlineData"]["data"], "QUJD");
    }
}
