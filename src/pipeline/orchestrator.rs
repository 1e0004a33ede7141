use super::context::ResolutionContext;
use super::phase_trait::ResolutionPhase;
use super::phases::{ProcessPhase, RootPathPhase, SelectStackPhase, ToolsPhase, VersionPhase};
use crate::config::StackboxConfig;
use crate::error::Result;
use crate::fs::ProjectTree;
use crate::http::HttpClient;
use crate::recipe::Recipe;
use crate::sources::Sources;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Resolves projects into complete recipes by running every phase in order.
#[derive(Clone)]
pub struct RecipePipeline {
    sources: Sources,
}

impl RecipePipeline {
    pub fn new(sources: Sources) -> Self {
        Self { sources }
    }

    /// Pipeline backed by the remote feeds, sharing one cache-aware client.
    pub fn from_config(config: &StackboxConfig) -> Result<Self> {
        let client = Arc::new(HttpClient::new(config)?);
        Ok(Self::new(Sources::remote(client, config)))
    }

    fn phases() -> Vec<Box<dyn ResolutionPhase>> {
        vec![
            Box::new(SelectStackPhase),
            Box::new(RootPathPhase),
            Box::new(ProcessPhase),
            Box::new(VersionPhase),
            Box::new(ToolsPhase),
        ]
    }

    /// Resolves the project rooted at `tree`. Fails on the first failing phase.
    pub fn resolve_tree(&self, tree: ProjectTree) -> Result<Recipe> {
        let start = Instant::now();
        info!("Resolving recipe for {}", tree.root().display());

        let mut context = ResolutionContext::new(tree, self.sources.clone());
        for phase in Self::phases() {
            info!("Phase: {}", phase.name());
            phase.execute(&mut context)?;
            debug!("Phase {} complete", phase.name());
        }

        debug!("Resolution took {:?}", start.elapsed());
        Ok(context.into_recipe())
    }

    pub fn resolve(&self, root: impl Into<PathBuf>) -> Result<Recipe> {
        self.resolve_tree(ProjectTree::real(root))
    }

    /// Resolves several projects concurrently. Results keep the order of
    /// `roots`; one failing project does not affect the others.
    pub fn resolve_many(&self, roots: &[PathBuf]) -> Vec<Result<Recipe>> {
        thread::scope(|scope| {
            let handles: Vec<_> = roots
                .iter()
                .map(|root| scope.spawn(move || self.resolve(root.clone())))
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fs::MockFileSystem;
    use crate::sources::{MockReleaseSource, MockRuntimeIndex, MockTagSource};

    fn pipeline(tags: MockTagSource) -> RecipePipeline {
        RecipePipeline::new(Sources::new(
            Arc::new(tags),
            Arc::new(MockReleaseSource::new()),
            Arc::new(MockRuntimeIndex::new()),
        ))
    }

    fn tree(files: &[(&str, &str)]) -> ProjectTree {
        let fs = MockFileSystem::new();
        for (path, content) in files {
            fs.add_file(path, content);
        }
        ProjectTree::new(Arc::new(fs), "/mock")
    }

    #[test]
    fn test_resolves_python_project() {
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags()
            .returning(|_| Ok(vec!["3.12.1".to_string(), "3.11.7".to_string()]));

        let recipe = pipeline(tags)
            .resolve_tree(tree(&[
                ("requirements.txt", "flask\n"),
                ("runtime.txt", "python-3.11\n"),
                ("app.py", "app = Flask(__name__)\n"),
            ]))
            .unwrap();

        assert_eq!(recipe.image(), "python:3.11.7");
        assert_eq!(recipe.workdir, "/app");
        assert_eq!(recipe.process, vec!["gunicorn", "app:app"]);
        assert_eq!(recipe.tool_names(), vec!["pip", "pip", ""]);
        assert_eq!(recipe.tools[1].copy[""], vec!["requirements.txt"]);
    }

    #[test]
    fn test_phase_failure_has_no_output() {
        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags().returning(|_| Ok(vec![]));

        let err = pipeline(tags)
            .resolve_tree(tree(&[("package.json", "{}")]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVersion { .. }));
    }

    #[test]
    fn test_resolve_many_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("node");
        let empty = dir.path().join("empty");
        std::fs::create_dir_all(&node).unwrap();
        std::fs::create_dir_all(&empty).unwrap();
        std::fs::write(node.join("package.json"), r#"{"main": "index.js"}"#).unwrap();

        let mut tags = MockTagSource::new();
        tags.expect_fetch_tags()
            .returning(|_| Ok(vec!["20.11.0".to_string()]));

        let results = pipeline(tags).resolve_many(&[node, empty]);

        assert_eq!(results.len(), 2);
        let recipe = results[0].as_ref().unwrap();
        assert_eq!(recipe.image(), "node:20.11.0");
        assert_eq!(recipe.process, vec!["node", "index.js"]);
        assert!(matches!(results[1], Err(Error::NoSupportedStack { .. })));
    }
}
