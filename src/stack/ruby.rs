use super::Stack;
use crate::error::Result;
use crate::fs::ProjectTree;
use crate::recipe::{Recipe, Tool};
use std::collections::HashMap;

const USER: &str = "web";
/// The Node.js tarball carries `bin/`, `lib/` and `include/` for this prefix.
const NODE_PREFIX: &str = "/usr/local";

cached_regex!(spec_regex, r"^\s+([-\w]+)\s\(([.\d]+)\)");
cached_regex!(
    ruby_directive_regex,
    r#"['"]?([a-z_]+)['"]?[:=>\s]*['"]([a-z]*[^a-z]*\w)['"]"#
);

/// Interpreter declared by the Gemfile `ruby` directive.
#[derive(Debug, Default, PartialEq, Eq)]
struct RubyDirective {
    ruby: String,
    engine: String,
    engine_version: String,
}

/// Rack applications run with puma. Node is pulled in as a tool when the
/// asset pipeline needs it.
pub struct RubyStack<'a> {
    tree: &'a ProjectTree,
}

impl<'a> RubyStack<'a> {
    pub fn new(tree: &'a ProjectTree) -> Self {
        Self { tree }
    }

    /// Locked gems and their versions.
    fn specs(&self) -> HashMap<String, String> {
        self.tree
            .lines("Gemfile.lock")
            .unwrap_or_default()
            .iter()
            .filter_map(|line| spec_regex().captures(line))
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect()
    }

    fn directive(&self) -> RubyDirective {
        let mut directive = RubyDirective::default();
        let lines = self.tree.lines("Gemfile").unwrap_or_default();
        let Some(line) = lines.iter().find(|l| l.starts_with("ruby")) else {
            return directive;
        };

        for caps in ruby_directive_regex().captures_iter(line) {
            let value = caps[2].replace(['"', '\''], "");
            match &caps[1] {
                "ruby" => directive.ruby = value,
                "engine" => directive.engine = value,
                "engine_version" => directive.engine_version = value,
                _ => {}
            }
        }
        directive
    }
}

impl Stack for RubyStack<'_> {
    fn detect(&self) -> bool {
        self.tree.exists("Gemfile")
    }

    fn partial_recipe(&self) -> Recipe {
        let mut recipe = Recipe {
            user: USER.to_string(),
            ..Recipe::default()
        };

        let specs = self.specs();
        if !specs.contains_key("puma") {
            recipe
                .tools
                .push(Tool::new("gem").with_install(["install puma"]));
        }

        recipe.tools.push(
            Tool::new("bundle")
                .with_files(["Gemfile", "Gemfile.lock"])
                .with_install(["install"]),
        );

        let yarn = self.tree.exists("yarn.lock");
        let node = yarn || ["execjs", "webpacker"].iter().any(|g| specs.contains_key(*g));

        if node {
            recipe.tools.push(
                Tool::new("node")
                    .with_owner("nodejs")
                    .with_extract_to(NODE_PREFIX),
            );
        }
        if yarn {
            recipe.tools.push(
                Tool::new("yarn")
                    .with_shell("corepack enable")
                    .with_files(["package.json", "yarn.lock"])
                    .with_install(["install"]),
            );
        }
        recipe
    }

    /// `ruby`, or the alternative engine (e.g. `jruby`) the Gemfile declares.
    fn name(&self) -> String {
        let directive = self.directive();
        if directive.engine.is_empty() {
            "ruby".to_string()
        } else {
            directive.engine
        }
    }

    fn start_command(&self) -> Result<String> {
        if self.tree.exists("config.ru") {
            Ok("puma -p ${PORT-3000}".to_string())
        } else {
            Ok(String::new())
        }
    }

    fn version_constraint(&self) -> Result<String> {
        let directive = self.directive();
        if !directive.engine.is_empty() && !directive.engine_version.is_empty() {
            Ok(directive.engine_version)
        } else {
            Ok(directive.ruby)
        }
    }
}
