use crate::error::{Error, Result};
use crate::fs::ProjectTree;
use crate::pipeline::phase_trait::ResolutionPhase;
use crate::pipeline::ResolutionContext;
use crate::recipe::{HookKind, Tool};
use crate::resolve::version::{base_of, parse_tag, Constraint};
use crate::resolve::{copy, DownloadResolver};
use tracing::debug;

/// Node releases whose npm supports `npm ci`.
const NPM_CI_RANGE: &str = "^8.12 || >=10.3";

/// Runs each tool's hook, plans its file copies and resolves its download,
/// in declaration order.
pub struct ToolsPhase;

impl ResolutionPhase for ToolsPhase {
    fn name(&self) -> &'static str {
        "ToolsPhase"
    }

    fn execute(&self, context: &mut ResolutionContext) -> Result<()> {
        let downloads = DownloadResolver::new(
            context.sources.releases.clone(),
            context.sources.runtimes.clone(),
        );
        let version = context.recipe.stack_version.clone();

        for tool in &mut context.recipe.tools {
            if let Some(hook) = tool.hook {
                run_hook(hook, tool, &context.tree, &version)?;
            }
            tool.copy = copy::plan(&context.tree, &tool.files)?;
            downloads.resolve(tool)?;
            debug!("Tool {:?} resolved", tool.name);
        }
        Ok(())
    }
}

fn run_hook(hook: HookKind, tool: &mut Tool, tree: &ProjectTree, version: &str) -> Result<()> {
    match hook {
        HookKind::NpmCleanInstall => {
            if !tree.exists("package-lock.json") {
                return Ok(());
            }
            let range = Constraint::parse(NPM_CI_RANGE).map_err(|reason| {
                Error::InvalidConstraint {
                    stack: tool.name.clone(),
                    constraint: NPM_CI_RANGE.to_string(),
                    reason,
                }
            })?;
            if parse_tag(base_of(version)).is_some_and(|v| range.matches(&v)) {
                debug!("Node {} supports npm ci", version);
                tool.install = vec!["ci".to_string()];
            }
            Ok(())
        }
    }
}
