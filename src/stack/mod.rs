//! Stack detection.
//!
//! Each supported stack inspects the project tree through a [`ProjectTree`]
//! and, when it recognises the project, describes it as a partial [`Recipe`]
//! plus a start command and a version constraint. Stacks are tried in the
//! fixed order of [`StackKind::PRIORITY`]; the first one that claims the
//! project wins. Secondary ecosystems (Node assets in a Rails app) are folded
//! in as tools by the winning stack.

use crate::error::{Error, Result};
use crate::fs::ProjectTree;
use crate::recipe::Recipe;
use std::fmt;
use tracing::debug;

/// Declares a lazily compiled, process-wide regex accessor.
macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static RE: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            RE.get_or_init(|| ::regex::Regex::new($pattern).expect("valid regex"))
        }
    };
}

mod go;
mod node;
mod php;
mod python;
mod ruby;

pub use go::GoLikeStack;
pub use node::NodeStack;
pub use php::PhpStack;
pub use python::PythonStack;
pub use ruby::RubyStack;

pub trait Stack {
    /// Whether the project belongs to this stack. Only looks at the tree.
    fn detect(&self) -> bool;

    /// Stack-specific part of the recipe: tools, packages, env and user.
    fn partial_recipe(&self) -> Recipe;

    /// Base image name.
    fn name(&self) -> String;

    /// Declared start command; empty keeps the image default.
    fn start_command(&self) -> Result<String>;

    /// Declared runtime version constraint; empty means any version.
    fn version_constraint(&self) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackKind {
    GoLike,
    Php,
    Python,
    Ruby,
    Node,
}

impl StackKind {
    /// Detection order. Earlier stacks take precedence when several match.
    pub const PRIORITY: [StackKind; 5] = [
        StackKind::GoLike,
        StackKind::Php,
        StackKind::Python,
        StackKind::Ruby,
        StackKind::Node,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::GoLike => "golang",
            StackKind::Php => "php",
            StackKind::Python => "python",
            StackKind::Ruby => "ruby",
            StackKind::Node => "node",
        }
    }

    pub fn detector<'a>(&self, tree: &'a ProjectTree) -> Box<dyn Stack + 'a> {
        match self {
            StackKind::GoLike => Box::new(GoLikeStack::new(tree)),
            StackKind::Php => Box::new(PhpStack::new(tree)),
            StackKind::Python => Box::new(PythonStack::new(tree)),
            StackKind::Ruby => Box::new(RubyStack::new(tree)),
            StackKind::Node => Box::new(NodeStack::new(tree)),
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First stack, in priority order, that claims the tree.
pub fn detect_stack(tree: &ProjectTree) -> Result<(StackKind, Box<dyn Stack + '_>)> {
    for kind in StackKind::PRIORITY {
        let detector = kind.detector(tree);
        if detector.detect() {
            debug!("Detected {} stack in {}", kind, tree.root().display());
            return Ok((kind, detector));
        }
        debug!("Stack {} does not match", kind);
    }

    Err(Error::NoSupportedStack {
        path: tree.root().to_path_buf(),
    })
}
