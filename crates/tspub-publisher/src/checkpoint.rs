//! Resume checkpoint.
//!
//! Written to the bundle directory after every successful transition and
//! removed once the product is published.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tspub_core::{PublishError, PublishResult};

pub const CHECKPOINT_FILE: &str = ".tspub-checkpoint.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub draft_id: String,
    /// File names of attached files, in attach order
    #[serde(default)]
    pub files: Vec<String>,
    /// Source names of attached previews
    #[serde(default)]
    pub previews: Vec<String>,
    /// Positions of set certifications in the bundle's list
    #[serde(default)]
    pub certifications: Vec<usize>,
}

impl Checkpoint {
    pub fn new(draft_id: impl Into<String>) -> Self {
        Self {
            draft_id: draft_id.into(),
            ..Self::default()
        }
    }

    pub fn path(directory: &Path) -> PathBuf {
        directory.join(CHECKPOINT_FILE)
    }

    /// Load the checkpoint of `directory`, if one exists.
    pub fn load(directory: &Path) -> PublishResult<Option<Self>> {
        let path = Self::path(directory);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let checkpoint = serde_json::from_str(&raw).map_err(|e| {
            PublishError::Validation(format!("{} is corrupt: {}", path.display(), e))
        })?;
        Ok(Some(checkpoint))
    }

    pub fn save(&self, directory: &Path) -> PublishResult<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(directory), raw)?;
        Ok(())
    }

    pub fn remove(directory: &Path) -> PublishResult<()> {
        let path = Self::path(directory);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn has_file(&self, file_name: &str) -> bool {
        self.files.iter().any(|f| f == file_name)
    }

    pub fn has_preview(&self, file_name: &str) -> bool {
        self.previews.iter().any(|p| p == file_name)
    }

    pub fn has_certification(&self, index: usize) -> bool {
        self.certifications.contains(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Checkpoint::load(dir.path()).unwrap(), None);
        Checkpoint::remove(dir.path()).unwrap();
    }

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut checkpoint = Checkpoint::new("555");
        checkpoint.files.push("chair.max".into());
        checkpoint.certifications.push(1);
        checkpoint.save(dir.path()).unwrap();

        let loaded = Checkpoint::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(loaded.has_file("chair.max"));
        assert!(!loaded.has_preview("thumb.png"));
        assert!(loaded.has_certification(1));
        assert!(!loaded.has_certification(0));

        Checkpoint::remove(dir.path()).unwrap();
        assert!(!Checkpoint::path(dir.path()).exists());
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Checkpoint::path(dir.path()), "{not json").unwrap();
        assert!(matches!(
            Checkpoint::load(dir.path()),
            Err(PublishError::Validation(_))
        ));
    }
}
