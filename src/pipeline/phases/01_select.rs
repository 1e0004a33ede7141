use crate::error::Result;
use crate::pipeline::phase_trait::ResolutionPhase;
use crate::pipeline::ResolutionContext;
use crate::stack::detect_stack;
use tracing::info;

/// Picks the first stack claiming the project and seeds the recipe with its
/// partial description.
pub struct SelectStackPhase;

impl ResolutionPhase for SelectStackPhase {
    fn name(&self) -> &'static str {
        "SelectStackPhase"
    }

    fn execute(&self, context: &mut ResolutionContext) -> Result<()> {
        let (kind, stack) = detect_stack(&context.tree)?;

        let mut recipe = stack.partial_recipe();
        recipe.stack_name = stack.name();
        let command = stack.start_command()?;
        let constraint = stack.version_constraint()?;

        info!(
            "Selected stack {} (image {}, constraint {:?})",
            kind, recipe.stack_name, constraint
        );

        context.stack = Some(kind);
        context.recipe = recipe;
        context.command = command;
        context.constraint = constraint;
        Ok(())
    }
}
