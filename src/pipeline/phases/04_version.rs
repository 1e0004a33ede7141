use crate::error::Result;
use crate::pipeline::phase_trait::ResolutionPhase;
use crate::pipeline::ResolutionContext;
use crate::resolve::VersionResolver;
use tracing::info;

/// Pins the base image tag.
pub struct VersionPhase;

impl ResolutionPhase for VersionPhase {
    fn name(&self) -> &'static str {
        "VersionPhase"
    }

    fn execute(&self, context: &mut ResolutionContext) -> Result<()> {
        let resolver = VersionResolver::new(context.sources.tags.clone());
        let recipe = &mut context.recipe;

        recipe.stack_version =
            resolver.resolve(&recipe.stack_name, &recipe.variant, &context.constraint)?;
        info!("Resolved base image {}", recipe.image());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::phases::test_support::{context, sources};
    use crate::sources::{MockReleaseSource, MockRuntimeIndex, MockTagSource};
    use mockall::predicate::eq;

    fn tag_source(stack: &'static str, tags: &'static [&'static str]) -> MockTagSource {
        let mut mock = MockTagSource::new();
        mock.expect_fetch_tags()
            .with(eq(stack))
            .times(1)
            .returning(move |_| Ok(tags.iter().map(|t| t.to_string()).collect()));
        mock
    }

    #[test]
    fn test_uses_variant_and_constraint() {
        let tags = tag_source("php", &["8.3.0-apache", "8.2.12-apache", "8.2.12-fpm", "8.2.12"]);
        let mut ctx = context(&[], sources(tags, MockReleaseSource::new(), MockRuntimeIndex::new()));
        ctx.recipe.stack_name = "php".to_string();
        ctx.recipe.variant = "apache".to_string();
        ctx.constraint = "8.2".to_string();

        VersionPhase.execute(&mut ctx).unwrap();
        assert_eq!(ctx.recipe.stack_version, "8.2.12-apache");
    }

    #[test]
    fn test_unsatisfiable_constraint() {
        let tags = tag_source("python", &["3.12.1", "3.11.7"]);
        let mut ctx = context(&[], sources(tags, MockReleaseSource::new(), MockRuntimeIndex::new()));
        ctx.recipe.stack_name = "python".to_string();
        ctx.constraint = "2.7".to_string();

        let err = VersionPhase.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownVersion { ref stack, .. } if stack == "python"));
        assert!(ctx.recipe.stack_version.is_empty());
    }
}
