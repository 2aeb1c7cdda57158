//! Persisted session state: generation history, trial flag, page and tab.
//!
//! Everything the app remembers between sessions lives in one versioned
//! [`SessionState`] blob, saved as JSON through a [`StateBackend`]. The
//! in-memory state is always authoritative: a persist failure (quota ceiling,
//! serialization, I/O) is logged and swallowed, never surfaced.
//!
//! History is newest-first and capped at [`HISTORY_CAP`] entries; images in a
//! [`HistoryItem`] are storage-recompressed copies, distinct from the
//! working-resolution payloads held by the active session.

use crate::error::{AppError, Result};
use crate::types::{Slot, ThumbnailSet};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Maximum number of retained history entries. The oldest beyond the cap is
/// dropped on every persist.
pub const HISTORY_CAP: usize = 20;

/// Version stamp of the persisted format. A mismatch on load discards the
/// stored blob; there is no migration path.
pub const SCHEMA_VERSION: u32 = 1;

/// Hard ceiling of the persistence medium.
const MAX_PERSIST_BYTES: usize = 5 * 1024 * 1024;

/// Top-level page the user last had open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Landing,
    Studio,
}

/// One completed generation, committed at pipeline success and never mutated
/// afterwards. Deleted only by explicit user action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub date: u64,
    pub summary: String,
    /// Recompressed copies of all four variants.
    pub images: ThumbnailSet,
}

impl HistoryItem {
    pub fn from_generation(summary: &str, images: ThumbnailSet, timestamp: u64) -> Self {
        Self {
            id: format!("gen-{timestamp}"),
            title: title_from_summary(summary),
            date: timestamp,
            summary: summary.to_string(),
            images,
        }
    }
}

/// First sentence of the summary, clamped for display.
fn title_from_summary(summary: &str) -> String {
    let first_sentence = summary
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(summary)
        .trim();
    let mut title: String = first_sentence.chars().take(80).collect();
    if title.is_empty() {
        title = "Untitled generation".to_string();
    }
    title
}

/// Everything persisted between sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionState {
    pub schema_version: u32,
    pub trial_used: bool,
    pub current_page: Page,
    pub active_tab: Slot,
    pub history: Vec<HistoryItem>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            trial_used: false,
            current_page: Page::default(),
            active_tab: Slot::ALL[0],
            history: Vec::new(),
        }
    }
}

/// Storage medium for the serialized session blob.
pub trait StateBackend {
    /// Returns the stored blob, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, json: &str) -> Result<()>;
}

/// JSON file in the user's config directory
/// (e.g. `~/.config/thumbsmith/session.json` on Linux), with the capacity
/// ceiling of the persistence medium enforced on every save.
pub struct JsonFileBackend {
    path: Option<PathBuf>,
}

impl JsonFileBackend {
    pub fn new() -> Self {
        let path = ProjectDirs::from("", "thumbsmith", "thumbsmith").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("session.json")
        });
        Self { path }
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl Default for JsonFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else { return Ok(None) };
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, json: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Err(AppError::persistence("no config directory available".to_string()));
        };
        if json.len() > MAX_PERSIST_BYTES {
            return Err(AppError::persistence(format!(
                "session blob of {} bytes exceeds the {} byte quota",
                json.len(),
                MAX_PERSIST_BYTES
            )));
        }
        fs::write(path, json)?;
        Ok(())
    }
}

/// In-memory session state plus its persistence boundary.
///
/// Mutating operations persist after every change; the in-memory view stays
/// the source of truth when persisting fails.
pub struct SessionStore<B: StateBackend> {
    state: SessionState,
    backend: B,
}

impl<B: StateBackend> SessionStore<B> {
    /// Loads persisted state, falling back to defaults when nothing is
    /// stored, the blob is unreadable, or its schema version differs.
    pub fn open(backend: B) -> Self {
        let state = match backend.load() {
            Ok(Some(json)) => match serde_json::from_str::<SessionState>(&json) {
                Ok(state) if state.schema_version == SCHEMA_VERSION => state,
                Ok(state) => {
                    tracing::warn!(
                        found = state.schema_version,
                        expected = SCHEMA_VERSION,
                        "discarding persisted session with mismatched schema version"
                    );
                    SessionState::default()
                }
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unreadable persisted session");
                    SessionState::default()
                }
            },
            Ok(None) => SessionState::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted session");
                SessionState::default()
            }
        };
        Self { state, backend }
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.state.history
    }

    pub fn trial_used(&self) -> bool {
        self.state.trial_used
    }

    pub fn current_page(&self) -> Page {
        self.state.current_page
    }

    pub fn active_tab(&self) -> Slot {
        self.state.active_tab
    }

    /// Inserts at the head and truncates to the cap before persisting.
    pub fn append_history(&mut self, mut item: HistoryItem) {
        if self.state.history.iter().any(|existing| existing.id == item.id) {
            item.id = format!("{}-{}", item.id, self.state.history.len());
        }
        self.state.history.insert(0, item);
        self.state.history.truncate(HISTORY_CAP);
        self.persist();
    }

    /// Removes the item with the given id, if present.
    pub fn remove_history(&mut self, id: &str) -> bool {
        let before = self.state.history.len();
        self.state.history.retain(|item| item.id != id);
        let removed = self.state.history.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn mark_trial_used(&mut self) {
        self.state.trial_used = true;
        self.persist();
    }

    pub fn set_current_page(&mut self, page: Page) {
        self.state.current_page = page;
        self.persist();
    }

    pub fn set_active_tab(&mut self, slot: Slot) {
        self.state.active_tab = slot;
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.state)
            .map_err(AppError::from)
            .and_then(|json| self.backend.save(&json));
        if let Err(err) = result {
            // In-memory state remains authoritative for this session.
            tracing::warn!(error = %err, "failed to persist session state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Backend writing into a shared string, with an optional failure switch.
    struct MemoryBackend {
        stored: RefCell<Option<String>>,
        fail_saves: bool,
    }

    impl MemoryBackend {
        fn new() -> Self {
            Self { stored: RefCell::new(None), fail_saves: false }
        }

        fn failing() -> Self {
            Self { stored: RefCell::new(None), fail_saves: true }
        }

        fn seeded(json: &str) -> Self {
            Self { stored: RefCell::new(Some(json.to_string())), fail_saves: false }
        }
    }

    impl StateBackend for MemoryBackend {
        fn load(&self) -> Result<Option<String>> {
            Ok(self.stored.borrow().clone())
        }

        fn save(&self, json: &str) -> Result<()> {
            if self.fail_saves {
                return Err(AppError::persistence("quota exceeded".to_string()));
            }
            *self.stored.borrow_mut() = Some(json.to_string());
            Ok(())
        }
    }

    fn item(n: u64) -> HistoryItem {
        HistoryItem::from_generation(
            &format!("Summary number {n}. More detail follows."),
            ThumbnailSet::from_fn(|_| "aW1n".to_string()),
            n,
        )
    }

    #[test]
    fn history_is_capped_at_twenty_newest_first() {
        let mut store = SessionStore::open(MemoryBackend::new());
        for n in 0..25 {
            store.append_history(item(n));
        }
        assert_eq!(store.history().len(), HISTORY_CAP);
        assert_eq!(store.history()[0].id, "gen-24");
        assert_eq!(store.history()[HISTORY_CAP - 1].id, "gen-5");
    }

    #[test]
    fn remove_filters_by_id() {
        let mut store = SessionStore::open(MemoryBackend::new());
        store.append_history(item(1));
        store.append_history(item(2));
        assert!(store.remove_history("gen-1"));
        assert!(!store.remove_history("gen-1"));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn failing_persist_never_escapes_and_memory_stays_authoritative() {
        let mut store = SessionStore::open(MemoryBackend::failing());
        store.append_history(item(7));
        store.mark_trial_used();
        assert_eq!(store.history().len(), 1);
        assert!(store.trial_used());
    }

    #[test]
    fn schema_version_mismatch_resets_to_defaults() {
        let mut old = SessionState::default();
        old.schema_version = SCHEMA_VERSION + 1;
        old.trial_used = true;
        let backend = MemoryBackend::seeded(&serde_json::to_string(&old).unwrap());

        let store = SessionStore::open(backend);
        assert!(!store.trial_used());
        assert!(store.history().is_empty());
    }

    #[test]
    fn state_round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::open(JsonFileBackend::at_path(path.clone()));
        store.append_history(item(3));
        store.mark_trial_used();
        store.set_current_page(Page::Studio);

        let reloaded = SessionStore::open(JsonFileBackend::at_path(path));
        assert_eq!(reloaded.history().len(), 1);
        assert_eq!(reloaded.history()[0].title, "Summary number 3.");
        assert!(reloaded.trial_used());
        assert_eq!(reloaded.current_page(), Page::Studio);
    }

    #[test]
    fn oversized_blob_is_rejected_by_the_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::at_path(dir.path().join("session.json"));
        let huge = "x".repeat(MAX_PERSIST_BYTES + 1);
        assert!(backend.save(&huge).is_err());
    }

    #[test]
    fn title_is_the_first_sentence() {
        assert_eq!(title_from_summary("A dramatic shot! With more."), "A dramatic shot!");
        assert_eq!(title_from_summary(""), "Untitled generation");
    }
}
