//! Product bundle: the local description of what gets published.
//!
//! A bundle is a directory containing a `product.json` file next to the model
//! files and previews it references by relative path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

use super::attachment::{is_hidden, FileEntry, PreviewEntry};
use super::draft::{DraftAttributes, DraftSpec};
use crate::error::{PublishError, PublishResult};

pub const BUNDLE_DESCRIPTION_FILE: &str = "product.json";

#[derive(Debug, Deserialize)]
struct BundleDescription {
    product: DraftSpec,
    #[serde(default)]
    files: Vec<FileEntry>,
    #[serde(default)]
    previews: Vec<PreviewEntry>,
    #[serde(default)]
    certifications: Vec<String>,
}

/// Ordered bundle description loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductBundle {
    /// Directory every file name is relative to
    pub directory: PathBuf,
    pub draft: DraftSpec,
    pub files: Vec<FileEntry>,
    pub previews: Vec<PreviewEntry>,
    pub certifications: Vec<String>,
}

impl ProductBundle {
    /// Load a bundle from a directory (reads `product.json` inside it) or from a
    /// description file (its parent becomes the bundle directory).
    pub fn load(path: impl AsRef<Path>) -> PublishResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            PublishError::Validation(format!("Unable to find {}: {}", path.display(), e))
        })?;

        let (description_path, directory) = if metadata.is_dir() {
            (path.join(BUNDLE_DESCRIPTION_FILE), path.to_path_buf())
        } else {
            let directory = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (path.to_path_buf(), directory)
        };

        let raw = std::fs::read_to_string(&description_path).map_err(|e| {
            PublishError::Validation(format!(
                "Unable to read {}: {}",
                description_path.display(),
                e
            ))
        })?;

        Self::parse(&raw, directory)
    }

    pub fn parse(raw: &str, directory: PathBuf) -> PublishResult<Self> {
        let description: BundleDescription = serde_json::from_str(raw).map_err(|e| {
            PublishError::Validation(format!("Unable to parse bundle description: {}", e))
        })?;

        Ok(Self {
            directory,
            draft: description.product,
            files: description.files,
            previews: description.previews,
            certifications: description.certifications,
        })
    }

    /// Attribute set sent when the draft is created.
    pub fn draft_attributes(&self) -> DraftAttributes {
        DraftAttributes::from(&self.draft)
    }

    /// Absolute (or directory-relative) path of a bundle entry.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }

    /// Frames of a turntable directory, in listing order, hidden entries excluded.
    ///
    /// Entries are sorted by file name so the listing order is stable across
    /// platforms. Returned names are relative to the bundle directory.
    pub fn turntable_frames(&self, dir_name: &str) -> PublishResult<Vec<String>> {
        let dir = self.resolve(dir_name);
        let entries = std::fs::read_dir(&dir).map_err(|e| {
            PublishError::Validation(format!(
                "Unable to read turntable directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| format!("{}/{}", dir_name.trim_end_matches('/'), name))
            .collect())
    }

    /// Check everything that can be checked locally before any remote call.
    pub fn preflight(&self) -> PublishResult<()> {
        self.draft.validate()?;

        for file in &self.files {
            let path = self.resolve(&file.file_name);
            if !path.is_file() {
                return Err(PublishError::Validation(format!(
                    "{} file {} does not exist",
                    file.kind,
                    path.display()
                )));
            }
        }

        for preview in &self.previews {
            let path = self.resolve(preview.file_name());
            match preview {
                PreviewEntry::Thumbnail { .. } if !path.is_file() => {
                    return Err(PublishError::Validation(format!(
                        "thumbnail {} does not exist",
                        path.display()
                    )));
                }
                PreviewEntry::Turntable { file_name, .. } => {
                    if self.turntable_frames(file_name)?.is_empty() {
                        return Err(PublishError::Validation(format!(
                            "turntable directory {} contains no frames",
                            path.display()
                        )));
                    }
                }
                _ => {}
            }
        }

        if self.certifications.iter().any(|c| c.trim().is_empty()) {
            return Err(PublishError::Validation(
                "certification identifiers must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
