//! Lexical helpers for in-container (always `/`-separated) paths.
//!
//! Container paths never touch the host filesystem, so they are handled as
//! strings rather than `std::path::Path`, which would use host separators.

/// Lexically normalizes a path: collapses repeated separators, removes `.`
/// segments and resolves `..` against preceding segments. An empty result
/// becomes `.`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Joins two path fragments and cleans the result. Empty fragments are ignored.
pub fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, true) => String::new(),
        (true, false) => clean(rest),
        (false, true) => clean(base),
        (false, false) => clean(&format!("{}/{}", base, rest)),
    }
}

/// Last element of the path, `/` for the root.
pub fn base_name(path: &str) -> String {
    let cleaned = clean(path);
    if cleaned == "/" {
        return cleaned;
    }
    cleaned
        .rsplit('/')
        .next()
        .unwrap_or(cleaned.as_str())
        .to_string()
}

/// Containing directory of a relative path, `""` when it sits at the root.
pub fn parent_dir(path: &str) -> String {
    match clean(path).rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        Some(_) => "/".to_string(),
        None => String::new(),
    }
}
