//! Access to the note that is currently open in the host.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;
use crate::render::is_markdown_path;

/// The file behind the active editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFile {
    pub path: PathBuf,
    /// File name without its extension.
    pub basename: String,
}

impl ActiveFile {
    pub fn from_path(path: &Path) -> Self {
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            basename,
        }
    }
}

/// Host state the composer reads from.
pub trait Workspace {
    /// The focused file, if any.
    fn active_file(&self) -> Option<ActiveFile>;

    /// Full text of the active editor, only when it is a markdown editor.
    ///
    /// A markdown document that cannot be read is an error, not `None`.
    fn active_markdown_text(&self) -> Result<Option<String>>;
}

/// A workspace whose only open document is a file on disk.
#[derive(Debug, Clone, Default)]
pub struct FileWorkspace {
    path: Option<PathBuf>,
}

impl FileWorkspace {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Some(path.into()))
    }
}

impl Workspace for FileWorkspace {
    fn active_file(&self) -> Option<ActiveFile> {
        let path = self.path.as_deref()?;
        if !path.is_file() {
            debug!("{} is not an open file", path.display());
            return None;
        }
        Some(ActiveFile::from_path(path))
    }

    fn active_markdown_text(&self) -> Result<Option<String>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        if !is_markdown_path(path) {
            debug!("{} is not a markdown document", path.display());
            return Ok(None);
        }
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                warn!("reading {}: {e}", path.display());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_basename_strips_extension() {
        let file = ActiveFile::from_path(Path::new("/vault/Weekly Notes.md"));
        assert_eq!(file.basename, "Weekly Notes");
    }

    #[test]
    fn test_basename_keeps_inner_dots() {
        let file = ActiveFile::from_path(Path::new("v1.2 release.md"));
        assert_eq!(file.basename, "v1.2 release");
    }

    #[test]
    fn test_no_path_means_nothing_open() {
        let ws = FileWorkspace::default();
        assert!(ws.active_file().is_none());
        assert!(ws.active_markdown_text().unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_not_active() {
        let temp = TempDir::new().unwrap();
        let ws = FileWorkspace::open(temp.path().join("gone.md"));
        assert!(ws.active_file().is_none());
    }

    #[test]
    fn test_markdown_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Notes.md");
        fs::write(&path, "Hello *world*").unwrap();
        let ws = FileWorkspace::open(&path);
        assert_eq!(ws.active_file().unwrap().basename, "Notes");
        assert_eq!(
            ws.active_markdown_text().unwrap().as_deref(),
            Some("Hello *world*")
        );
    }

    #[test]
    fn test_non_markdown_file_has_no_markdown_view() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("diagram.canvas");
        fs::write(&path, "{}").unwrap();
        let ws = FileWorkspace::open(&path);
        assert!(ws.active_file().is_some());
        assert!(ws.active_markdown_text().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_markdown_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Latin1.md");
        fs::write(&path, [b'c', b'a', b'f', 0xe9, b'\n']).unwrap();
        let ws = FileWorkspace::open(&path);

        assert!(ws.active_file().is_some());
        let err = ws.active_markdown_text().unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
