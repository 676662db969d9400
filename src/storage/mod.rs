use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::chat::Conversation;
use crate::error::ChatError;

/// Fixed storage key for the saved conversation list.
const STORE_FILE: &str = "conversations.json";
const APP_DIR: &str = "wiseinvest";

/// Persistence seam for conversation history.
///
/// Callers treat persistence as best-effort: load failures become an empty
/// list and save failures are logged, never propagated into a send.
pub trait ConversationStore: Send + Sync {
    fn load(&self) -> Result<Vec<Conversation>, ChatError>;
    fn save(&self, conversations: &[Conversation]) -> Result<(), ChatError>;
}

/// Conversation list stored as one JSON file in the platform data directory.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data dir, e.g.
    /// `~/.local/share/wiseinvest/conversations.json` on Linux.
    pub fn in_data_dir() -> Result<Self, ChatError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| ChatError::Precondition("no platform data directory".into()))?;
        Ok(Self::new(dir.join(APP_DIR).join(STORE_FILE)))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ConversationStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Conversation>, ChatError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ChatError::Storage(err.to_string())),
        };
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, conversations: &[Conversation]) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| ChatError::Storage(err.to_string()))?;
        }
        let text = serde_json::to_string(conversations)?;
        fs::write(&self.path, text).map_err(|err| ChatError::Storage(err.to_string()))
    }
}

/// Volatile store for tests and embedders that manage persistence themselves.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Vec<Conversation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryStore {
    fn load(&self) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.inner.lock().expect("store lock poisoned").clone())
    }

    fn save(&self, conversations: &[Conversation]) -> Result<(), ChatError> {
        *self.inner.lock().expect("store lock poisoned") = conversations.to_vec();
        Ok(())
    }
}
