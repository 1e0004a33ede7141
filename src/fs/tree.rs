use super::{FileSystem, RealFileSystem};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Directories never descended into when expanding globs.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// A project directory seen through a [`FileSystem`].
///
/// All paths taken and returned are relative to the project root and use `/`
/// separators.
#[derive(Clone)]
pub struct ProjectTree {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl ProjectTree {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn real(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(RealFileSystem), root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        if rel.is_empty() || rel == "." {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.fs.exists(&self.path(rel))
    }

    pub fn read(&self, rel: &str) -> Result<String> {
        let path = self.path(rel);
        self.fs
            .read_to_string(&path)
            .map_err(|source| Error::Filesystem { path, source })
    }

    /// Reads a file that may legitimately be absent.
    pub fn read_optional(&self, rel: &str) -> Result<Option<String>> {
        if self.fs.is_file(&self.path(rel)) {
            self.read(rel).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn lines(&self, rel: &str) -> Result<Vec<String>> {
        Ok(self.read(rel)?.lines().map(str::to_string).collect())
    }

    /// Every file below the root in sorted depth-first order.
    pub fn walk(&self) -> Result<Vec<String>> {
        let files = self
            .fs
            .walk(&self.root, SKIPPED_DIRS)
            .map_err(|source| Error::Filesystem {
                path: self.root.clone(),
                source,
            })?;

        Ok(files
            .iter()
            .map(|path| {
                path.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .collect())
    }

    /// Expands a glob pattern (`**` crosses directories) into matching files.
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| Error::manifest(pattern, format!("invalid glob pattern: {}", e)))?;
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let matches: Vec<String> = self
            .walk()?
            .into_iter()
            .filter(|path| matcher.matches_with(path, options))
            .collect();

        debug!("Glob {} matched {} file(s)", pattern, matches.len());
        Ok(matches)
    }
}
