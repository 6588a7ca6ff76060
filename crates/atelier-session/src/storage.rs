use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ChatSession;

/// File name of the session list inside the storage directory.
pub const STORE_FILE: &str = "sessions.json";

/// Flat-file persistence for the session list.
///
/// The whole list is rewritten on every mutation and read once at startup.
/// There is no schema versioning or migration; a file that fails to parse
/// is treated as absent by the caller.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted session list. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<ChatSession>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the whole session list.
    pub async fn save(&self, sessions: &[ChatSession]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(sessions)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionFile::new(dir.path());

        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionFile::new(dir.path());

        let session = ChatSession::new("hello", "openai");
        storage.save(std::slice::from_ref(&session)).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, session.id);
        assert_eq!(loaded[0].title, session.title);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionFile::new(dir.path());

        tokio::fs::write(storage.path(), b"not json").await.unwrap();

        assert!(storage.load().await.is_err());
    }
}
