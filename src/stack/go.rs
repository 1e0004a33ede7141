use super::Stack;
use crate::error::Result;
use crate::fs::ProjectTree;
use crate::recipe::{Recipe, RootManifest, Tool};

const INSTALL: &str = "go install -v -ldflags '-s -w' .";

/// Go projects, managed by any of the dependency tools that predate or
/// include modules.
pub struct GoLikeStack<'a> {
    tree: &'a ProjectTree,
}

impl<'a> GoLikeStack<'a> {
    pub fn new(tree: &'a ProjectTree) -> Self {
        Self { tree }
    }
}

impl Stack for GoLikeStack<'_> {
    fn detect(&self) -> bool {
        [
            "Gopkg.toml",
            "glide.yaml",
            "Godeps/Godeps.json",
            "go.mod",
            "vendor/vendor.json",
        ]
        .iter()
        .any(|f| self.tree.exists(f))
    }

    fn partial_recipe(&self) -> Recipe {
        let mut recipe = Recipe {
            install: vec![INSTALL.to_string()],
            ..Recipe::default()
        };

        if self.tree.exists("Gopkg.toml") {
            recipe.tools.push(
                Tool::new("dep")
                    .with_owner("golang")
                    .with_files(["Gopkg.toml", "Gopkg.lock"])
                    .with_install(["ensure -vendor-only"]),
            );
        } else if self.tree.exists("glide.yaml") {
            recipe.root = Some(RootManifest::new("glide.yaml", "package"));
            recipe.tools.push(
                Tool::new("glide")
                    .with_owner("Masterminds")
                    .with_files(["glide.yaml", "glide.lock"])
                    .with_install(["install -v", "cache-clear"]),
            );
        } else if self.tree.exists("Godeps/Godeps.json") {
            recipe.root = Some(RootManifest::new("Godeps/Godeps.json", "ImportPath"));
            recipe.tools.push(
                Tool::new("godep")
                    .with_owner("tools")
                    .with_files(["Godeps/Godeps.json"])
                    .with_install(["restore"]),
            );
        } else if self.tree.exists("go.mod") {
            recipe.set_env("GO111MODULE", "on");
            recipe.root = Some(RootManifest::new("go.mod", "module"));
            recipe.tools.push(
                Tool::new("go mod")
                    .with_files(["go.mod", "go.sum"])
                    .with_install(["download"]),
            );
        } else if self.tree.exists("vendor/vendor.json") {
            recipe.root = Some(RootManifest::new("vendor/vendor.json", "rootPath"));
            recipe.tools.push(
                Tool::new("govendor")
                    .with_owner("kardianos")
                    .with_files(["vendor/vendor.json"])
                    .with_install(["sync"]),
            );
        }

        recipe
    }

    fn name(&self) -> String {
        "golang".to_string()
    }

    fn start_command(&self) -> Result<String> {
        Ok(String::new())
    }

    fn version_constraint(&self) -> Result<String> {
        Ok(String::new())
    }
}
