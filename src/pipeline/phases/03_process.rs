use crate::error::Result;
use crate::pipeline::phase_trait::ResolutionPhase;
use crate::pipeline::ResolutionContext;

/// Turns the start command into `CMD` arguments.
pub struct ProcessPhase;

impl ResolutionPhase for ProcessPhase {
    fn name(&self) -> &'static str {
        "ProcessPhase"
    }

    fn execute(&self, context: &mut ResolutionContext) -> Result<()> {
        context.recipe.process = process_args(&context.command);
        Ok(())
    }
}

/// Commands referencing variables need a shell to expand them.
pub fn process_args(command: &str) -> Vec<String> {
    if command.contains('$') {
        vec!["sh".to_string(), "-c".to_string(), command.to_string()]
    } else {
        command.split_whitespace().map(str::to_string).collect()
    }
}
