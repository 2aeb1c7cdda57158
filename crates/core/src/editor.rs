//! Post-generation editing with per-slot undo stacks.
//!
//! Every (style, orientation) slot keeps its own append-only history; the
//! tail is the current image. Edits send only the current image of the
//! targeted slot, never the original reference photos, and an edit failure
//! leaves the slot untouched.

use crate::error::{AppError, Result};
use crate::gemini::{GenerationService, PromptPart};
use crate::types::{Slot, SlotMap, ThumbnailSet};

/// Append-only edit history for a single slot. Never empty once seeded.
#[derive(Clone, Debug, Default)]
pub struct EditHistory {
    entries: Vec<String>,
}

impl EditHistory {
    pub fn new(base_image: String) -> Self {
        Self { entries: vec![base_image] }
    }

    /// The current image, i.e. the most recent entry.
    pub fn current(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, image: String) {
        self.entries.push(image);
    }

    /// Pops the most recent entry and makes the new tail current.
    /// No-op at length 1 — the base image is never removed.
    fn undo(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }
}

/// Working state of a completed generation: four slots, each with its own
/// undo stack, plus the slot currently exposed as the edit target.
#[derive(Clone, Debug)]
pub struct ResultSession {
    histories: SlotMap<EditHistory>,
    active_slot: Slot,
}

impl ResultSession {
    pub fn new(images: &ThumbnailSet) -> Self {
        Self {
            histories: images.map(|_, payload| EditHistory::new(payload.clone())),
            active_slot: Slot::ALL[0],
        }
    }

    pub fn active_slot(&self) -> Slot {
        self.active_slot
    }

    pub fn set_active_slot(&mut self, slot: Slot) {
        self.active_slot = slot;
    }

    pub fn current(&self, slot: Slot) -> &str {
        self.histories.get(slot).current()
    }

    pub fn history_len(&self, slot: Slot) -> usize {
        self.histories.get(slot).len()
    }

    /// Snapshot of the current image per slot.
    pub fn images(&self) -> ThumbnailSet {
        self.histories.map(|_, history| history.current().to_string())
    }

    /// Applies a single-image edit to one slot and appends the result to that
    /// slot's history. On error nothing changes; the failure is local to the
    /// edit and never disturbs other slots or the orchestrator.
    pub async fn apply_edit<S: GenerationService>(
        &mut self,
        service: &S,
        slot: Slot,
        instruction: &str,
    ) -> Result<&str> {
        let current = self.histories.get(slot).current().to_string();
        let edited = edit(service, &current, instruction, slot).await?;
        let history = self.histories.get_mut(slot);
        history.push(edited);
        Ok(history.current())
    }

    /// Undoes the most recent edit of one slot. Returns false when the slot
    /// is already at its base image.
    pub fn undo(&mut self, slot: Slot) -> bool {
        self.histories.get_mut(slot).undo()
    }
}

/// Sends one edit request for the given slot's current image.
async fn edit<S: GenerationService>(
    service: &S,
    current_image: &str,
    instruction: &str,
    slot: Slot,
) -> Result<String> {
    let parts = vec![
        PromptPart::png(current_image.to_string()),
        PromptPart::text(edit_prompt(instruction, slot)),
    ];

    let response = service.generate_image(&parts, slot.orientation).await?;
    response
        .into_image("the edited thumbnail")
        .map_err(|err| match err {
            AppError::Refusal(text) => AppError::Refusal(format!("Edit declined: {text}")),
            other => other,
        })
}

fn edit_prompt(instruction: &str, slot: Slot) -> String {
    format!(
        "You are a professional Thumbnail Editor.\n\
         \n\
         [INPUT IMAGE]\n\
         The attached image is the current state of a video thumbnail.\n\
         \n\
         [USER REQUEST]\n\
         \"{instruction}\"\n\
         \n\
         [TASK]\n\
         Generate a modified version of the Input Image that incorporates the User Request.\n\
         \n\
         [STRICT RULES]\n\
         1. LOOK at the Input Image. KEEP the same layout, same person (Subject), and same \
         background UNLESS the user explicitly asks to change them.\n\
         2. If the user asks to change the text, keep the background and person exactly the \
         same and only change the text.\n\
         3. Color or lighting requests apply to the EXISTING composition.\n\
         4. Do not generate a random new image. This is an EDITING task.\n\
         5. Output must be {}.\n",
        slot.orientation.ratio()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::ImageResponse;
    use crate::test_support::MockService;
    use crate::types::{Orientation, Style};

    fn seeded_session() -> ResultSession {
        let images = ThumbnailSet::from_fn(|slot| format!("base-{}-{}", slot.style, slot.orientation.ratio_slug()));
        ResultSession::new(&images)
    }

    #[tokio::test]
    async fn edit_appends_to_exactly_one_slot() {
        let mut session = seeded_session();
        let slot = Slot::new(Style::Clickbait, Orientation::Horizontal);
        let service = MockService::new();
        service.push_image(Ok(ImageResponse { image: Some("edited".into()), text: None }));

        let new_image = session.apply_edit(&service, slot, "make the text bigger").await.unwrap();
        assert_eq!(new_image, "edited");
        assert_eq!(session.history_len(slot), 2);
        for other in Slot::ALL.into_iter().filter(|s| *s != slot) {
            assert_eq!(session.history_len(other), 1);
        }

        // Only the slot's current image is sent, never the references.
        let calls = service.calls();
        assert_eq!(calls[0].inline_payloads, vec!["base-clickbait-16-9"]);
        assert_eq!(calls[0].ratio.as_deref(), Some("16:9"));
    }

    #[tokio::test]
    async fn failed_edit_leaves_history_untouched() {
        let mut session = seeded_session();
        let slot = Slot::new(Style::Normal, Orientation::Vertical);
        let service = MockService::new();
        service.push_image(Ok(ImageResponse { image: None, text: Some("no".into()) }));

        let err = session.apply_edit(&service, slot, "add fire").await.unwrap_err();
        assert_eq!(err.to_string(), "Edit declined: no");
        assert_eq!(session.history_len(slot), 1);
        assert_eq!(session.current(slot), "base-normal-9-16");
    }

    #[test]
    fn undo_at_length_one_is_a_noop() {
        let mut session = seeded_session();
        let slot = Slot::new(Style::Normal, Orientation::Horizontal);
        assert!(!session.undo(slot));
        assert_eq!(session.history_len(slot), 1);
    }

    #[tokio::test]
    async fn undo_removes_one_entry_and_restores_the_tail() {
        let mut session = seeded_session();
        let slot = Slot::new(Style::Normal, Orientation::Horizontal);
        let service = MockService::new();
        service.push_image(Ok(ImageResponse { image: Some("v2".into()), text: None }));
        service.push_image(Ok(ImageResponse { image: Some("v3".into()), text: None }));

        session.apply_edit(&service, slot, "step one").await.unwrap();
        session.apply_edit(&service, slot, "step two").await.unwrap();
        assert_eq!(session.current(slot), "v3");

        assert!(session.undo(slot));
        assert_eq!(session.current(slot), "v2");
        assert_eq!(session.history_len(slot), 2);

        assert!(session.undo(slot));
        assert_eq!(session.current(slot), "base-normal-16-9");
        assert!(!session.undo(slot));
    }
}
