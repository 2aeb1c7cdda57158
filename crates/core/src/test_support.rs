//! Scripted stand-in for the generation service, shared by the pipeline
//! tests. Replies are queued per call kind; unscripted image calls yield
//! unique synthetic payloads so happy paths need no setup.

use crate::error::Result;
use crate::gemini::{GenerationService, ImageResponse, PromptPart};
use crate::types::Orientation;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallKind {
    Text,
    Image,
}

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub prompt: String,
    pub inline_payloads: Vec<String>,
    pub ratio: Option<String>,
    pub used_search: bool,
}

#[derive(Default)]
pub struct MockService {
    text_replies: Mutex<VecDeque<Result<String>>>,
    image_replies: Mutex<VecDeque<Result<ImageResponse>>>,
    recorded: Mutex<Vec<RecordedCall>>,
    image_counter: Mutex<usize>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, reply: Result<String>) {
        self.text_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_image(&self, reply: Result<ImageResponse>) {
        self.image_replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().clone()
    }
}

impl GenerationService for MockService {
    async fn generate_text(&self, prompt: &str, use_search: bool) -> Result<String> {
        self.recorded.lock().unwrap().push(RecordedCall {
            kind: CallKind::Text,
            prompt: prompt.to_string(),
            inline_payloads: Vec::new(),
            ratio: None,
            used_search: use_search,
        });
        self.text_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("A generated visual description.".to_string()))
    }

    async fn generate_image(
        &self,
        parts: &[PromptPart],
        orientation: Orientation,
    ) -> Result<ImageResponse> {
        let mut prompt = String::new();
        let mut inline_payloads = Vec::new();
        for part in parts {
            match part {
                PromptPart::Text(text) => prompt.push_str(text),
                PromptPart::InlineImage { data, .. } => inline_payloads.push(data.clone()),
            }
        }
        self.recorded.lock().unwrap().push(RecordedCall {
            kind: CallKind::Image,
            prompt,
            inline_payloads,
            ratio: Some(orientation.ratio().to_string()),
            used_search: false,
        });

        if let Some(reply) = self.image_replies.lock().unwrap().pop_front() {
            return reply;
        }
        let mut counter = self.image_counter.lock().unwrap();
        let n = *counter;
        *counter += 1;
        Ok(ImageResponse { image: Some(format!("img-{n}")), text: None })
    }
}
