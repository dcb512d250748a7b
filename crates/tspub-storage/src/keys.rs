//! Remote key generation for uploaded objects.

use std::path::Path;

use crate::session::{StorageError, StorageResult};

/// Remote key for `source`: the credential key prefix followed by the file's base name.
pub fn remote_key(key_prefix: &str, source: &Path) -> StorageResult<String> {
    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StorageError::InvalidKey(source.display().to_string()))?;
    Ok(format!("{}{}", key_prefix, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_remote_key_uses_base_name() {
        let key = remote_key("incoming/42/", &PathBuf::from("/bundle/turntable/a.png")).unwrap();
        assert_eq!(key, "incoming/42/a.png");
    }

    #[test]
    fn test_remote_key_without_file_name() {
        assert!(matches!(
            remote_key("p/", &PathBuf::from("/")),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
