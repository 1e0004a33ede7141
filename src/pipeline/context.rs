//! Mutable state threaded through the resolution phases.

use crate::fs::ProjectTree;
use crate::recipe::Recipe;
use crate::sources::Sources;
use crate::stack::StackKind;

/// Everything one project resolution reads and produces.
///
/// Created empty by the pipeline, filled in phase by phase. The recipe is
/// only handed out once every phase succeeded.
pub struct ResolutionContext {
    /// The project being resolved.
    pub tree: ProjectTree,

    /// Remote feeds used for version and download resolution.
    pub sources: Sources,

    /// Stack that claimed the project, set by stack selection.
    pub stack: Option<StackKind>,

    /// Recipe under construction.
    pub recipe: Recipe,

    /// Start command declared by the stack.
    pub command: String,

    /// Runtime version constraint declared by the stack.
    pub constraint: String,
}

impl ResolutionContext {
    pub fn new(tree: ProjectTree, sources: Sources) -> Self {
        Self {
            tree,
            sources,
            stack: None,
            recipe: Recipe::default(),
            command: String::new(),
            constraint: String::new(),
        }
    }

    pub fn into_recipe(self) -> Recipe {
        self.recipe
    }
}
