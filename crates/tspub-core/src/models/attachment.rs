//! File and preview attachments.
//!
//! The bundle description declares each file and preview with a `type` tag.
//! The tag is resolved once, at load time, into a closed enum whose variants
//! carry exactly the metadata their attach call needs.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Remote id of a file that finished server-side processing.
pub type FileId = u64;

/// Hidden-entry marker for turntable directories.
pub const HIDDEN_FILE_MARKER: char = '.';

/// Returns true for directory entries skipped when gathering turntable frames.
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with(HIDDEN_FILE_MARKER)
}

/// Format and renderer information of a product file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFileInfo {
    pub file_format: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub renderer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub renderer_version: String,
    #[serde(default)]
    pub is_native: bool,
}

/// Variant of a draft file together with its variant-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileKind {
    ProductFile(ProductFileInfo),
    CustomerFile {
        #[serde(default)]
        description: String,
    },
    PromotionalFile {
        #[serde(default)]
        description: String,
    },
    TextureFile {
        #[serde(default)]
        description: String,
    },
    ViewerFile {
        #[serde(default)]
        description: String,
    },
}

impl FileKind {
    /// Resource type name used on the wire (e.g. `product_file`).
    pub fn resource_type(&self) -> &'static str {
        match self {
            FileKind::ProductFile(_) => "product_file",
            FileKind::CustomerFile { .. } => "customer_file",
            FileKind::PromotionalFile { .. } => "promotional_file",
            FileKind::TextureFile { .. } => "texture_file",
            FileKind::ViewerFile { .. } => "viewer_file",
        }
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.resource_type())
    }
}

/// A local file declared in the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    /// Path relative to the bundle directory
    pub file_name: String,
    #[serde(flatten)]
    pub kind: FileKind,
}

impl FileEntry {
    /// Build the attachment once the file's upload job succeeded.
    pub fn attach(&self, file_id: FileId) -> FileAttachment {
        FileAttachment {
            file_id,
            kind: self.kind.clone(),
        }
    }
}

/// File reference attached to a draft. Only built from a confirmed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_id: FileId,
    pub kind: FileKind,
}

/// A preview declared in the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreviewEntry {
    /// Single static image
    Thumbnail {
        file_name: String,
        #[serde(default)]
        thumbnail_type: String,
    },
    /// Directory of frames forming a rotating preview
    Turntable {
        file_name: String,
        #[serde(default)]
        thumbnail_type: String,
    },
}

impl PreviewEntry {
    pub fn file_name(&self) -> &str {
        match self {
            PreviewEntry::Thumbnail { file_name, .. } | PreviewEntry::Turntable { file_name, .. } => {
                file_name
            }
        }
    }

    pub fn thumbnail_type(&self) -> &str {
        match self {
            PreviewEntry::Thumbnail { thumbnail_type, .. }
            | PreviewEntry::Turntable { thumbnail_type, .. } => thumbnail_type,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            PreviewEntry::Thumbnail { .. } => "thumbnail",
            PreviewEntry::Turntable { .. } => "turntable",
        }
    }
}

/// Preview attached to a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAttachment {
    Thumbnail {
        file_id: FileId,
        thumbnail_type: String,
    },
    Turntable {
        file_ids: Vec<FileId>,
        thumbnail_type: String,
    },
}

impl PreviewAttachment {
    pub fn resource_type(&self) -> &'static str {
        match self {
            PreviewAttachment::Thumbnail { .. } => "thumbnail",
            PreviewAttachment::Turntable { .. } => "turntable",
        }
    }
}
