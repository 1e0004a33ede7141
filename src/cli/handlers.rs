use super::commands::{DetectArgs, DockerfileArgs};
use super::output::OutputFormatter;
use crate::config::StackboxConfig;
use crate::pipeline::RecipePipeline;
use crate::render::DockerfileGenerator;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

fn load_pipeline() -> Result<RecipePipeline> {
    let config = StackboxConfig::default();
    config
        .validate()
        .context("Invalid configuration, check the STACKBOX_* environment variables")?;
    debug!("Configuration: {}", config);

    RecipePipeline::from_config(&config).context("Failed to initialise HTTP client")
}

fn project_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", path.display());
    }
    path.canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", path.display()))
}

/// One-line report of a failed resolution including every underlying cause.
fn failure_message(root: &Path, err: crate::Error) -> String {
    let err = anyhow::Error::new(err).context(format!("Failed to resolve {}", root.display()));
    format!("{:#}", err)
}

pub fn handle_dockerfile(args: &DockerfileArgs) -> i32 {
    let pipeline = match load_pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{:#}", e);
            return 1;
        }
    };

    let mut roots = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        match project_dir(path) {
            Ok(root) => roots.push(root),
            Err(e) => {
                error!("{:#}", e);
                return 1;
            }
        }
    }

    info!("Resolving {} project(s)", roots.len());
    let many = roots.len() > 1;
    let mut exit_code = 0;

    for (root, result) in roots.iter().zip(pipeline.resolve_many(&roots)) {
        match result {
            Ok(recipe) => {
                if many {
                    println!("# {}", root.display());
                }
                print!("{}", DockerfileGenerator::new(&recipe).render());
                if many {
                    println!();
                }
            }
            Err(e) => {
                error!("{}", failure_message(root, e));
                exit_code = 1;
            }
        }
    }
    exit_code
}

pub fn handle_detect(args: &DetectArgs) -> i32 {
    match detect(args) {
        Ok(output) => {
            println!("{}", output.trim_end());
            0
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn detect(args: &DetectArgs) -> Result<String> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let root = project_dir(&path)?;
    debug!("Project path: {}", root.display());

    let recipe = load_pipeline()?
        .resolve(&root)
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    OutputFormatter::new(args.format.into()).format(&recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_dir_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("package.json");
        std::fs::write(&file, "{}").unwrap();

        let err = project_dir(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        assert!(project_dir(dir.path()).is_ok());
    }

    #[test]
    fn test_failure_message_keeps_cause_chain() {
        let err = crate::Error::Http {
            url: "https://api.github.com/repos/Masterminds/glide/releases/latest".to_string(),
            status: 404,
        }
        .for_tool("glide");

        let message = failure_message(Path::new("/srv/worker"), err);
        assert_eq!(
            message,
            "Failed to resolve /srv/worker: failed to resolve tool glide: \
             request to https://api.github.com/repos/Masterminds/glide/releases/latest \
             failed with HTTP 404"
        );
    }
}
