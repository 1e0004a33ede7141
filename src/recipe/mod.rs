//! The resolved build description handed to the renderer.
//!
//! A [`Recipe`] starts life as the partial fragment a stack detector returns
//! and is completed by the resolution pipeline. Once rendered it is never
//! modified.

mod tool;

pub use tool::{Artifact, CopyPlan, HookKind, Tool};

use serde::Serialize;
use std::collections::BTreeMap;

/// An extra apt repository registered before packages are installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AptSource {
    /// The `deb ...` line written to the sources list.
    pub entry: String,
    pub key_url: String,
    /// File name under `/etc/apt/sources.list.d`.
    pub file: String,
}

/// A shell-level build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildDependency {
    /// Commands chained with `&&`, each prefixed with `prefix` when set.
    Compound {
        prefix: Option<String>,
        commands: Vec<String>,
    },
    /// One command applied to a list of arguments.
    Listed { command: String, args: Vec<String> },
}

/// A manifest declaring the project's import path, read as `file#key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootManifest {
    pub file: String,
    pub key: String,
}

impl RootManifest {
    pub fn new(file: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub stack_name: String,
    /// Resolved base image tag.
    pub stack_version: String,
    /// Prerelease qualifier of the base image tag, e.g. `apache`.
    pub variant: String,
    /// Absolute in-container project path. Empty until resolved.
    pub workdir: String,
    /// Runtime user; empty keeps the image's default (root).
    pub user: String,
    pub env: BTreeMap<String, String>,
    pub packages: Vec<String>,
    pub apt_sources: Vec<AptSource>,
    pub dependencies: Vec<BuildDependency>,
    pub tools: Vec<Tool>,
    /// Install steps run after the whole project is copied.
    pub install: Vec<String>,
    /// Arguments of the default container command.
    pub process: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<RootManifest>,
}

impl Recipe {
    pub fn image(&self) -> String {
        format!("{}:{}", self.stack_name, self.stack_version)
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image() {
        let recipe = Recipe {
            stack_name: "php".to_string(),
            stack_version: "8.2.12-apache".to_string(),
            ..Recipe::default()
        };
        assert_eq!(recipe.image(), "php:8.2.12-apache");
    }

    #[test]
    fn test_env_is_key_ordered() {
        let mut recipe = Recipe::default();
        recipe.set_env("PIP_USER", "true");
        recipe.set_env("PATH", "/home/web/.local/bin:$PATH");

        let keys: Vec<&String> = recipe.env.keys().collect();
        assert_eq!(keys, vec!["PATH", "PIP_USER"]);
    }

    #[test]
    fn test_serialize_omits_missing_root() {
        let json = serde_json::to_value(Recipe::default()).unwrap();
        assert!(json.get("root").is_none());
        assert_eq!(json["stack_name"], "");
    }

    #[test]
    fn test_dependency_serializes_tagged() {
        let dep = BuildDependency::Listed {
            command: "docker-php-ext-install".to_string(),
            args: vec!["gd".to_string()],
        };
        let json = serde_json::to_value(dep).unwrap();
        assert_eq!(json["kind"], "listed");
        assert_eq!(json["args"][0], "gd");
    }
}
