use super::FileSystem;
use anyhow::{Context, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
    }

    fn walk(&self, root: &Path, excluded: &[&str]) -> Result<Vec<PathBuf>> {
        let mut override_builder = OverrideBuilder::new(root);
        for dir in excluded {
            override_builder
                .add(&format!("!{}/", dir))
                .with_context(|| format!("Invalid exclusion {:?}", dir))?;
        }
        let overrides = override_builder
            .build()
            .context("Failed to build walk overrides")?;

        let mut files = Vec::new();
        for result in WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .overrides(overrides)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
        {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };

            // Symlinks are reported as themselves; only a link to a regular
            // file counts, and no link is ever descended into.
            let is_file = match entry.file_type() {
                Some(ft) if ft.is_file() => true,
                Some(ft) if ft.is_symlink() => entry.path().is_file(),
                _ => false,
            };
            if !is_file {
                continue;
            }

            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            files.push(rel.to_path_buf());
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir_all(base.join("sub/deep")).unwrap();
        fs::create_dir_all(base.join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(base.join(".git")).unwrap();
        fs::write(base.join("package.json"), r#"{"name": "web"}"#).unwrap();
        fs::write(base.join("sub/package.json"), r#"{"name": "lib"}"#).unwrap();
        fs::write(base.join("sub/deep/app.py"), "").unwrap();
        fs::write(base.join("node_modules/left-pad/package.json"), "{}").unwrap();
        fs::write(base.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(base.join(".nvmrc"), "20\n").unwrap();

        dir
    }

    #[test]
    fn test_exists_and_kinds() {
        let temp = create_project();
        let fs = RealFileSystem::new();

        assert!(fs.exists(&temp.path().join("package.json")));
        assert!(!fs.exists(&temp.path().join("yarn.lock")));
        assert!(fs.is_dir(&temp.path().join("sub")));
        assert!(fs.is_file(&temp.path().join("sub/package.json")));
        assert!(!fs.is_file(&temp.path().join("sub")));
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_project();
        let fs = RealFileSystem::new();

        let content = fs.read_to_string(&temp.path().join("package.json")).unwrap();
        assert_eq!(content, r#"{"name": "web"}"#);
        assert!(fs.read_to_string(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_walk_sorted_with_exclusions() {
        let temp = create_project();
        let fs = RealFileSystem::new();

        let files = fs.walk(temp.path(), &[".git", "node_modules"]).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from(".nvmrc"),
                PathBuf::from("package.json"),
                PathBuf::from("sub/deep/app.py"),
                PathBuf::from("sub/package.json"),
            ]
        );
    }

    #[test]
    fn test_walk_ignores_gitignore() {
        let temp = create_project();
        fs::write(temp.path().join(".gitignore"), "sub/\n").unwrap();
        let fs = RealFileSystem::new();

        let files = fs.walk(temp.path(), &[".git", "node_modules"]).unwrap();
        assert!(files.contains(&PathBuf::from("sub/package.json")));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_does_not_follow_directory_symlinks() {
        let temp = create_project();
        std::os::unix::fs::symlink("..", temp.path().join("sub/up")).unwrap();
        std::os::unix::fs::symlink("package.json", temp.path().join("alias.json")).unwrap();
        let fs = RealFileSystem::new();

        let files = fs.walk(temp.path(), &[".git", "node_modules"]).unwrap();
        assert_eq!(
            files.iter().filter(|p| p.ends_with("app.py")).count(),
            1
        );
        assert!(files.contains(&PathBuf::from("alias.json")));
        assert!(!files.iter().any(|p| p.starts_with("sub/up")));
    }
}
