use super::Stack;
use crate::error::{Error, Result};
use crate::fs::ProjectTree;
use crate::recipe::{HookKind, Recipe, Tool};
use serde_json::Value;

const USER: &str = "node";
const WORKDIR: &str = "/home/node/app";

/// Node.js applications installed with npm or yarn.
pub struct NodeStack<'a> {
    tree: &'a ProjectTree,
}

impl<'a> NodeStack<'a> {
    pub fn new(tree: &'a ProjectTree) -> Self {
        Self { tree }
    }

    fn package_json(&self) -> Result<Value> {
        let content = self.tree.read("package.json")?;
        serde_json::from_str(&content).map_err(|e| Error::manifest("package.json", e))
    }

    fn has_script(&self, name: &str) -> bool {
        self.package_json()
            .map(|pkg| pkg["scripts"][name].is_string())
            .unwrap_or(false)
    }

    fn nvmrc(&self) -> Result<Option<String>> {
        Ok(self.tree.read_optional(".nvmrc")?.map(|content| {
            let version = content.trim();
            version.strip_prefix('v').unwrap_or(version).to_string()
        }))
    }
}

impl Stack for NodeStack<'_> {
    fn detect(&self) -> bool {
        self.tree.exists("package.json")
    }

    fn partial_recipe(&self) -> Recipe {
        let mut recipe = Recipe {
            user: USER.to_string(),
            workdir: WORKDIR.to_string(),
            ..Recipe::default()
        };
        recipe.set_env("PATH", format!("{}/node_modules/.bin:$PATH", WORKDIR));

        let tool = if self.tree.exists("yarn.lock") {
            Tool::new("yarn")
                .with_files(["**/package.json", "yarn.lock"])
                .with_install(["install"])
        } else {
            Tool::new("npm")
                .with_files(["package.json", "package-lock.json"])
                .with_install(["install"])
                .with_hook(HookKind::NpmCleanInstall)
        };

        if self.has_script("build") {
            recipe.install.push(format!("{} run build", tool.name));
        }
        recipe.tools.push(tool);
        recipe
    }

    fn name(&self) -> String {
        "node".to_string()
    }

    /// `node <main>` when package.json names an entry point, otherwise the
    /// `start` script.
    fn start_command(&self) -> Result<String> {
        let pkg = self.package_json()?;
        if let Some(main) = pkg["main"].as_str() {
            return Ok(format!("node {}", main));
        }
        Ok(pkg["scripts"]["start"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn version_constraint(&self) -> Result<String> {
        if self.tree.exists("package.json") {
            let pkg = self.package_json()?;
            if let Some(engine) = pkg["engines"]["node"].as_str() {
                return Ok(engine.replace("~>", "~"));
            }
        }
        Ok(self.nvmrc()?.unwrap_or_default())
    }
}
