//! Layer-friendly file selection.
//!
//! Each tool copies only the files its install step reads, grouped per
//! destination directory so the generator emits one `COPY` per group. Copying
//! manifests before the full tree keeps dependency layers cached across source
//! edits.

use crate::error::Result;
use crate::fs::ProjectTree;
use crate::recipe::CopyPlan;
use crate::util::paths;
use std::collections::HashSet;

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expands one pattern into project-relative paths. `.` stands for the whole
/// project.
pub fn expand(tree: &ProjectTree, pattern: &str) -> Result<Vec<String>> {
    if is_glob(pattern) {
        return tree.glob(pattern);
    }

    let path = paths::clean(pattern);
    if tree.exists(&path) {
        Ok(vec![path])
    } else {
        Ok(Vec::new())
    }
}

/// Groups every file matched by `patterns` under its containing directory.
/// Files keep the order of their first discovery.
pub fn plan<S: AsRef<str>>(tree: &ProjectTree, patterns: &[S]) -> Result<CopyPlan> {
    let mut seen = HashSet::new();
    let mut plan = CopyPlan::new();

    for pattern in patterns {
        for path in expand(tree, pattern.as_ref())? {
            if !seen.insert(path.clone()) {
                continue;
            }
            plan.entry(paths::parent_dir(&path))
                .or_insert_with(Vec::new)
                .push(path);
        }
    }

    Ok(plan)
}
