use super::context::ResolutionContext;
use crate::error::Result;

/// One step of recipe resolution. A failing phase aborts the run.
pub trait ResolutionPhase: Send + Sync {
    fn name(&self) -> &'static str;

    fn execute(&self, context: &mut ResolutionContext) -> Result<()>;
}
