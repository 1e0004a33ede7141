//! Read-only filesystem abstraction

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// Read-only view of the project tree. Detection and planning never write
/// through it, so the project directory is left untouched.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Every file below `root`, relative to it, in depth-first order with
    /// siblings sorted by name. Directories named in `excluded` are not
    /// entered at any depth and symlinked directories are never followed.
    fn walk(&self, root: &Path, excluded: &[&str]) -> Result<Vec<PathBuf>>;
}
