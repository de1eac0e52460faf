//! Temporary storage for attachments in transit.

use std::path::{Component, Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum StagingError {
    /// A file name would escape the staging root
    #[error("Path traversal attempt rejected: '{attempted}'")]
    PathTraversal { attempted: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory that holds downloaded attachments until they are attached to
/// the destination item.
///
/// # RAII Cleanup
///
/// The directory is removed on [`Drop`] unless `keep` was requested, so a run
/// that returns early still leaves nothing behind. Not `Clone` for the same
/// reason.
#[derive(Debug)]
pub struct AttachmentStaging {
    root: PathBuf,
    cleanup_on_drop: bool,
}

impl AttachmentStaging {
    /// Creates the staging root (and parents) if needed.
    pub fn create(root: PathBuf, keep: bool) -> Result<Self, StagingError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            cleanup_on_drop: !keep,
        })
    }

    /// Unique directory under the system temp dir.
    pub fn in_temp_dir(keep: bool) -> Result<Self, StagingError> {
        let root = std::env::temp_dir().join(format!(
            "vault-migrator-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        Self::create(root, keep)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `file_name` of item `item_id`, creating the item directory.
    ///
    /// # Errors
    ///
    /// Rejects names that are absolute or contain `..`.
    pub fn path_for(&self, item_id: &str, file_name: &str) -> Result<PathBuf, StagingError> {
        let relative = Path::new(item_id).join(file_name);
        let path = self.safe_child(&relative)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Resolves `relative` against the root, rejecting anything that would
    /// leave it.
    pub fn safe_child(&self, relative: &Path) -> Result<PathBuf, StagingError> {
        let reject = || StagingError::PathTraversal {
            attempted: relative.display().to_string(),
        };

        if relative.is_absolute() || relative.as_os_str().is_empty() {
            return Err(reject());
        }
        for component in relative.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(reject());
                }
                _ => {}
            }
        }
        Ok(self.root.join(relative))
    }
}

impl Drop for AttachmentStaging {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.root.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                tracing::warn!(
                    path = %self.root.display(),
                    error = %e,
                    "Failed to remove staging directory"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_child_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let staging = AttachmentStaging::create(dir.path().join("stage"), true).unwrap();

        assert!(staging.safe_child(Path::new("../../etc/passwd")).is_err());
        assert!(staging.safe_child(Path::new("/etc/passwd")).is_err());
        assert!(staging.path_for("item", "../escape.txt").is_err());
        assert!(staging.safe_child(Path::new("item/file.txt")).is_ok());
    }

    #[test]
    fn test_path_for_creates_item_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staging = AttachmentStaging::create(dir.path().join("stage"), false).unwrap();

        let path = staging.path_for("op-1", "scan.pdf").unwrap();
        assert_eq!(path, dir.path().join("stage").join("op-1").join("scan.pdf"));
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_cleanup_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("stage");

        let staging = AttachmentStaging::create(root.clone(), false).unwrap();
        std::fs::write(staging.path_for("a", "f.txt").unwrap(), b"x").unwrap();
        drop(staging);
        assert!(!root.exists());

        let kept = AttachmentStaging::create(root.clone(), true).unwrap();
        drop(kept);
        assert!(root.exists());
    }
}
