//! Discovery of render descriptors under a root directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{DescriptorError, RenderDescriptor};

const DESCRIPTOR_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct DescriptorScanner {
    root: PathBuf,
}

impl DescriptorScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `*.json` file below the root, in a stable order.
    ///
    /// The walk is lazy; calling this again starts a fresh walk.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + use<> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXTENSION))
    }

    /// Read one candidate. Files that are unreadable, invalid, or not
    /// descriptors are excluded rather than failing the batch.
    pub async fn load(&self, path: &Path) -> Option<RenderDescriptor> {
        match read_descriptor(path).await {
            Ok(Some(descriptor)) => Some(descriptor),
            Ok(None) => {
                debug!(path = %path.display(), "not a render descriptor");
                None
            }
            Err(err @ DescriptorError::InvalidData { .. }) => {
                warn!(error = %err, "excluding marked descriptor");
                None
            }
            Err(err) => {
                debug!(error = %err, "excluding candidate");
                None
            }
        }
    }
}

async fn read_descriptor(path: &Path) -> Result<Option<RenderDescriptor>, DescriptorError> {
    let contents = fs::read(path).await.map_err(|source| DescriptorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    RenderDescriptor::parse(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(&path, contents).expect("write");
        path
    }

    #[test]
    fn candidates_are_recursive_and_json_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = write(dir.path(), "a.json", "{}");
        let nested = write(dir.path(), "nested/deeper/b.json", "{}");
        write(dir.path(), "notes.txt", "hi");
        write(dir.path(), "image.png", "png");

        let scanner = DescriptorScanner::new(dir.path());
        let found: Vec<PathBuf> = scanner.candidates().collect();
        assert_eq!(found, vec![a, nested]);

        let again: Vec<PathBuf> = scanner.candidates().collect();
        assert_eq!(again.len(), 2);
    }

    #[tokio::test]
    async fn load_filters_to_descriptors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = write(dir.path(), "good.json", r#"{"renderform": true, "data": {}}"#);
        let plain = write(dir.path(), "package.json", r#"{"name": "x"}"#);
        let broken = write(dir.path(), "broken.json", "{ nope");

        let scanner = DescriptorScanner::new(dir.path());
        assert!(scanner.load(&good).await.is_some());
        assert!(scanner.load(&plain).await.is_none());
        assert!(scanner.load(&broken).await.is_none());
        assert!(scanner.load(&dir.path().join("gone.json")).await.is_none());
    }

    #[test]
    fn missing_root_yields_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scanner = DescriptorScanner::new(dir.path().join("absent"));
        assert_eq!(scanner.candidates().count(), 0);
    }
}
