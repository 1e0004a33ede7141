use crate::error::{Error, Result};
use crate::pipeline::phase_trait::ResolutionPhase;
use crate::pipeline::ResolutionContext;
use crate::recipe::{RootManifest, Tool};
use crate::stack::StackKind;
use crate::util::paths;
use tracing::debug;

/// In-container path used when nothing else decides it.
pub const DEFAULT_WORKDIR: &str = "/app";

const GO_SOURCE_ROOT: &str = "/go/src";

/// Decides the in-container project path and adds the tool copying the whole
/// project.
pub struct RootPathPhase;

impl ResolutionPhase for RootPathPhase {
    fn name(&self) -> &'static str {
        "RootPathPhase"
    }

    fn execute(&self, context: &mut ResolutionContext) -> Result<()> {
        let recipe = &mut context.recipe;
        recipe.tools.push(Tool::project(recipe.install.clone()));

        let declared = match &recipe.root {
            Some(root) => read_root_key(&context.tree.read(&root.file)?, root)?,
            None => None,
        };

        let mut path = match declared {
            Some(path) => paths::clean(&path),
            None => recipe.workdir.clone(),
        };
        if path.is_empty() || path == "." {
            path = DEFAULT_WORKDIR.to_string();
        }

        if context.stack == Some(StackKind::GoLike) {
            path = paths::join(GO_SOURCE_ROOT, &path);
            context.command = paths::base_name(&path);
        } else if !path.starts_with('/') {
            path = paths::join("/", &path);
        }

        debug!("Project path resolved to {}", path);
        recipe.workdir = path;
        Ok(())
    }
}

/// Value of the manifest's root key, parsed according to the file extension.
/// Unknown extensions and non-string values declare nothing.
pub fn read_root_key(content: &str, root: &RootManifest) -> Result<Option<String>> {
    let extension = root
        .file
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let key = root.key.as_str();

    let value = match extension.as_str() {
        "json" => serde_json::from_str::<serde_json::Value>(content)
            .map_err(|e| Error::manifest(&root.file, e))?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string),
        "yaml" | "yml" => serde_yaml::from_str::<serde_yaml::Value>(content)
            .map_err(|e| Error::manifest(&root.file, e))?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string),
        "toml" => content
            .parse::<toml::Value>()
            .map_err(|e| Error::manifest(&root.file, e))?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string),
        "mod" => module_path(content),
        _ => None,
    };
    Ok(value)
}

/// Module path declared by a `go.mod` file.
fn module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!module.is_empty()).then(|| module.to_string())
    })
}
