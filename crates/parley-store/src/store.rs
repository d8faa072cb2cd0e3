//! Client store backends.
//!
//! [`FileStore`] keeps the document at `<data_dir>/client.json` with 0o600
//! permissions; [`MemoryStore`] backs tests and ephemeral sessions.
//!
//! Every setter is load → patch → save, so concurrent processes see each
//! other's writes at the granularity of a single key.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use parley_core::PendingAction;

use crate::errors::StoreError;
use crate::types::{ClientDocument, Theme};

/// Default store file name.
const STORE_FILE_NAME: &str = "client.json";

/// Get the store file path under the given data directory.
pub fn store_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

/// Persistent key/value storage for the client.
pub trait ClientStore: Send + Sync {
    /// Load the whole document; missing or unreadable storage yields defaults.
    fn load(&self) -> ClientDocument;

    /// Replace the whole document.
    fn save(&self, doc: &ClientDocument) -> Result<(), StoreError>;

    /// Stored bearer token.
    fn token(&self) -> Option<String> {
        self.load().token
    }

    /// Store or clear the bearer token.
    fn set_token(&self, token: Option<String>) -> Result<(), StoreError> {
        let mut doc = self.load();
        doc.token = token;
        self.save(&doc)
    }

    /// Theme preference.
    fn theme(&self) -> Theme {
        self.load().theme
    }

    /// Persist the theme preference.
    fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        let mut doc = self.load();
        doc.theme = theme;
        self.save(&doc)
    }

    /// Whether info and success notices are shown.
    fn notifications(&self) -> bool {
        self.load().notifications
    }

    /// Persist the notifications preference.
    fn set_notifications(&self, enabled: bool) -> Result<(), StoreError> {
        let mut doc = self.load();
        doc.notifications = enabled;
        self.save(&doc)
    }

    /// Deferred actions, oldest first.
    fn offline_actions(&self) -> Vec<PendingAction> {
        self.load().offline_actions
    }

    /// Replace the deferred action log.
    fn set_offline_actions(&self, actions: &[PendingAction]) -> Result<(), StoreError> {
        let mut doc = self.load();
        doc.offline_actions = actions.to_vec();
        self.save(&doc)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileStore
// ─────────────────────────────────────────────────────────────────────────────

/// JSON file on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/client.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(store_file_path(data_dir))
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ClientStore for FileStore {
    fn load(&self) -> ClientDocument {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ClientDocument::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read client store: {e}");
                return ClientDocument::default();
            }
        };

        serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "failed to parse client store: {e}");
            ClientDocument::default()
        })
    }

    fn save(&self, doc: &ClientDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<ClientDocument>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a document.
    pub fn with_document(doc: ClientDocument) -> Self {
        Self {
            doc: Mutex::new(doc),
        }
    }
}

impl ClientStore for MemoryStore {
    fn load(&self) -> ClientDocument {
        self.doc.lock().clone()
    }

    fn save(&self, doc: &ClientDocument) -> Result<(), StoreError> {
        *self.doc.lock() = doc.clone();
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
